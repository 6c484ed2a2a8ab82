//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use chrono::NaiveDate;
use credent_core::domain::{Certificate, ContainerIssue, Employee, ExpiringEntry};
use serde::{Deserialize, Serialize};

/// employee.register.v1 - Register an employee and bootstrap their container
#[derive(Debug, Deserialize)]
pub struct RegisterEmployeeRequest {
    pub staff_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub department_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterEmployeeResponse {
    pub employee_id: String,
    pub staff_number: String,
    pub status: String,
}

/// employee.get.v1 - Fetch an employee
#[derive(Debug, Deserialize)]
pub struct GetEmployeeRequest {
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    pub employee_id: String,
    pub staff_number: String,
    pub full_name: String,
    pub email: String,
    pub department_id: Option<String>,
    pub status: String,
    pub compliance_status: Option<String>,
    pub container_checked_at: Option<i64>,
}

impl EmployeeView {
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id.clone(),
            staff_number: employee.staff_number.clone(),
            full_name: employee.full_name.clone(),
            email: employee.email.clone(),
            department_id: employee.department_id.clone(),
            status: employee.status.to_string(),
            compliance_status: employee.compliance_status.map(|s| s.to_string()),
            container_checked_at: employee.container_checked_at,
        }
    }
}

/// certificate.issue.v1 - Issue a certificate (supersedes older ones)
#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    pub employee_id: String,
    pub training_type_code: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateView {
    pub certificate_id: String,
    pub employee_id: String,
    pub training_type_id: String,
    pub generation: i64,
    pub status: String,
    pub verification_code: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub revoked_at: Option<i64>,
}

impl CertificateView {
    pub fn from_certificate(certificate: &Certificate) -> Self {
        Self {
            certificate_id: certificate.id.clone(),
            employee_id: certificate.employee_id.clone(),
            training_type_id: certificate.training_type_id.clone(),
            generation: certificate.generation,
            status: certificate.status.to_string(),
            verification_code: certificate.verification_code.as_str().to_string(),
            issue_date: certificate.issue_date,
            expiry_date: certificate.expiry_date,
            revoked_at: certificate.revoked_at,
        }
    }
}

/// certificate.revoke.v1 - Revoke a certificate (terminal)
#[derive(Debug, Deserialize)]
pub struct RevokeCertificateRequest {
    pub certificate_id: String,
}

/// compliance.employee.v1 - Evaluate one employee
#[derive(Debug, Deserialize)]
pub struct ComplianceEmployeeRequest {
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceEmployeeResponse {
    pub employee_id: String,
    pub status: String,
    pub missing: Vec<String>,
    pub expiring: Vec<ExpiringEntry>,
    pub evaluated_at: i64,
}

/// compliance.summary.v1 - Aggregate counts over active staff
#[derive(Debug, Deserialize)]
pub struct ComplianceSummaryRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceSummaryResponse {
    pub employees_evaluated: i64,
    pub compliant: i64,
    pub at_risk: i64,
    pub non_compliant: i64,
}

/// dispatch.run.v1 - Trigger one dispatch pass
#[derive(Debug, Deserialize)]
pub struct DispatchRunRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchRunResponse {
    pub scanned: usize,
    pub warnings_created: usize,
    pub expired_marked: usize,
    pub expired_notices: usize,
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

/// container.check.v1 - Health-check one container
#[derive(Debug, Deserialize)]
pub struct ContainerCheckRequest {
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerCheckResponse {
    pub employee_id: String,
    pub healthy: bool,
    pub issues: Vec<ContainerIssue>,
    pub checked_at: i64,
}

/// container.repair.v1 - Repair one container
#[derive(Debug, Deserialize)]
pub struct ContainerRepairRequest {
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerRepairResponse {
    pub employee_id: String,
    pub created_dirs: Vec<String>,
    pub metadata_rebuilt: bool,
    pub repaired_at: i64,
}

/// export.run.v1 - Export a dataset
#[derive(Debug, Deserialize)]
pub struct ExportRunRequest {
    /// "employees" or "certificates"
    pub dataset: String,
    /// "csv" or "json"
    pub format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRunResponse {
    pub dataset: String,
    pub format: String,
    pub path: String,
    pub rows: usize,
}

/// admin.stats.v1 - Engine statistics
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub active_employees: i64,
    pub active_certificates: i64,
    pub expiring_soon_certificates: i64,
    pub expired_certificates: i64,
    pub pending_notifications: i64,
    pub db_size_bytes: i64,
    pub disk_used_gb: u64,
    pub disk_total_gb: u64,
    pub uptime_seconds: i64,
}

/// admin.maintenance.v1 - Run manual maintenance
#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub reclaimed_mb: f64,
    pub db_size_mb: f64,
    pub notification_count: i64,
    pub pending_notifications: i64,
    pub fragmentation_percent: f64,
}
