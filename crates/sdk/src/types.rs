//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request to register an employee
#[derive(Debug, Clone, Serialize)]
pub struct RegisterEmployeeRequest {
    pub staff_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub department_id: Option<String>,
}

/// Response from the register operation
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterEmployeeResponse {
    pub employee_id: String,
    pub staff_number: String,
    pub status: String,
}

/// A stored employee
#[derive(Debug, Clone, Deserialize)]
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

/// Request to issue a certificate
#[derive(Debug, Clone, Serialize)]
pub struct IssueCertificateRequest {
    pub employee_id: String,
    pub training_type_code: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// A stored certificate
#[derive(Debug, Clone, Deserialize)]
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

/// One certificate inside the warning window
#[derive(Debug, Clone, Deserialize)]
pub struct ExpiringEntry {
    pub certificate_id: String,
    pub training_type_code: String,
    pub expiry_date: NaiveDate,
}

/// Response from a single-employee compliance evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceEmployeeResponse {
    pub employee_id: String,
    pub status: String,
    pub missing: Vec<String>,
    pub expiring: Vec<ExpiringEntry>,
    pub evaluated_at: i64,
}

/// Response from the roster-wide compliance summary
#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceSummaryResponse {
    pub employees_evaluated: i64,
    pub compliant: i64,
    pub at_risk: i64,
    pub non_compliant: i64,
}

/// Response from a manual dispatch pass
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRunResponse {
    pub scanned: usize,
    pub warnings_created: usize,
    pub expired_marked: usize,
    pub expired_notices: usize,
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Response from a container health check
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerCheckResponse {
    pub employee_id: String,
    pub healthy: bool,
    pub issues: Vec<serde_json::Value>,
    pub checked_at: i64,
}

/// Response from a container repair
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRepairResponse {
    pub employee_id: String,
    pub created_dirs: Vec<String>,
    pub metadata_rebuilt: bool,
    pub repaired_at: i64,
}

/// Response from an export run
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRunResponse {
    pub dataset: String,
    pub format: String,
    pub path: String,
    pub rows: usize,
}
