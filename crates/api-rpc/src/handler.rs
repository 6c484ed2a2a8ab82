//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method, delegating to
//! the application services. Mutating methods are rate limited; the long
//! running triggers (dispatch, maintenance) go through the schedule
//! runner so manual calls share the overlap guards with the loops.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    CertificateView, ComplianceEmployeeRequest, ComplianceEmployeeResponse,
    ComplianceSummaryRequest, ComplianceSummaryResponse, ContainerCheckRequest,
    ContainerCheckResponse, ContainerRepairRequest, ContainerRepairResponse, DispatchRunRequest,
    DispatchRunResponse, EmployeeView, ExportRunRequest, ExportRunResponse, GetEmployeeRequest,
    IssueCertificateRequest, MaintenanceRequest, MaintenanceResponse, RegisterEmployeeRequest,
    RegisterEmployeeResponse, RevokeCertificateRequest, StatsRequest, StatsResponse,
};
use credent_core::application::certificates::IssueRequest;
use credent_core::application::{
    CertificateService, ComplianceService, EmployeeService, ExportDataset, ExportFormat,
    ExportService, HealthChecker, RegisterRequest, ScheduleRunner,
};
use credent_core::domain::{CertificateStatus, DispatchState, EmploymentStatus};
use credent_core::error::AppError;
use credent_core::port::{
    CertificateRepository, EmployeeRepository, Maintenance, NotificationRepository, StorageProbe,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// Everything the handler needs, bundled at the composition root
pub struct RpcDeps {
    pub employees: Arc<EmployeeService>,
    pub certificates: Arc<CertificateService>,
    pub compliance: Arc<ComplianceService>,
    pub health_checker: Arc<HealthChecker>,
    pub exports: Arc<ExportService>,
    pub schedule: Arc<ScheduleRunner>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub certificate_repo: Arc<dyn CertificateRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub maintenance: Arc<dyn Maintenance>,
    pub storage_probe: Arc<dyn StorageProbe>,
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    deps: RpcDeps,
    rate_limiter: RateLimiter,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(deps: RpcDeps) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("CREDENT_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("CREDENT_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            deps,
            rate_limiter: RateLimiter::new(max_burst, rate_per_sec),
            start_time: std::time::Instant::now(),
        }
    }

    fn check_rate(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// employee.register.v1
    pub async fn register_employee(
        &self,
        params: RegisterEmployeeRequest,
    ) -> Result<RegisterEmployeeResponse, ErrorObjectOwned> {
        self.check_rate()?;

        let employee = self
            .deps
            .employees
            .register(RegisterRequest {
                staff_number: params.staff_number,
                full_name: params.full_name,
                email: params.email,
                department_id: params.department_id,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(RegisterEmployeeResponse {
            employee_id: employee.id,
            staff_number: employee.staff_number,
            status: employee.status.to_string(),
        })
    }

    /// employee.get.v1
    pub async fn get_employee(
        &self,
        params: GetEmployeeRequest,
    ) -> Result<EmployeeView, ErrorObjectOwned> {
        let employee = self
            .deps
            .employees
            .get(&params.employee_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(EmployeeView::from_employee(&employee))
    }

    /// certificate.issue.v1
    pub async fn issue_certificate(
        &self,
        params: IssueCertificateRequest,
    ) -> Result<CertificateView, ErrorObjectOwned> {
        self.check_rate()?;

        // Issue for a ghost employee would create an orphan series
        self.deps
            .employee_repo
            .find_by_id(&params.employee_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Employee {} not found",
                    params.employee_id
                )))
            })?;

        let certificate = self
            .deps
            .certificates
            .issue(IssueRequest {
                employee_id: params.employee_id,
                training_type_code: params.training_type_code,
                issue_date: params.issue_date,
                expiry_date: params.expiry_date,
                provider: params.provider,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(CertificateView::from_certificate(&certificate))
    }

    /// certificate.revoke.v1
    pub async fn revoke_certificate(
        &self,
        params: RevokeCertificateRequest,
    ) -> Result<CertificateView, ErrorObjectOwned> {
        self.check_rate()?;

        let certificate = self
            .deps
            .certificates
            .revoke(&params.certificate_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(CertificateView::from_certificate(&certificate))
    }

    /// compliance.employee.v1
    pub async fn compliance_employee(
        &self,
        params: ComplianceEmployeeRequest,
    ) -> Result<ComplianceEmployeeResponse, ErrorObjectOwned> {
        let employee = self
            .deps
            .employees
            .get(&params.employee_id)
            .await
            .map_err(to_rpc_error)?;

        let report = self
            .deps
            .compliance
            .evaluate(&employee)
            .await
            .map_err(to_rpc_error)?;

        Ok(ComplianceEmployeeResponse {
            employee_id: report.employee_id,
            status: report.status.to_string(),
            missing: report.missing,
            expiring: report.expiring,
            evaluated_at: report.evaluated_at,
        })
    }

    /// compliance.summary.v1
    pub async fn compliance_summary(
        &self,
        _params: ComplianceSummaryRequest,
    ) -> Result<ComplianceSummaryResponse, ErrorObjectOwned> {
        let summary = self
            .deps
            .compliance
            .summary()
            .await
            .map_err(to_rpc_error)?;

        Ok(ComplianceSummaryResponse {
            employees_evaluated: summary.employees_evaluated,
            compliant: summary.compliant,
            at_risk: summary.at_risk,
            non_compliant: summary.non_compliant,
        })
    }

    /// dispatch.run.v1
    pub async fn dispatch_run(
        &self,
        _params: DispatchRunRequest,
    ) -> Result<DispatchRunResponse, ErrorObjectOwned> {
        self.check_rate()?;

        let stats = self
            .deps
            .schedule
            .run_dispatch()
            .await
            .map_err(to_rpc_error)?;

        Ok(DispatchRunResponse {
            scanned: stats.scanned,
            warnings_created: stats.warnings_created,
            expired_marked: stats.expired_marked,
            expired_notices: stats.expired_notices,
            delivered: stats.delivered,
            retried: stats.retried,
            failed: stats.failed,
        })
    }

    /// container.check.v1
    pub async fn container_check(
        &self,
        params: ContainerCheckRequest,
    ) -> Result<ContainerCheckResponse, ErrorObjectOwned> {
        let report = self
            .deps
            .health_checker
            .check(&params.employee_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(ContainerCheckResponse {
            healthy: report.is_healthy(),
            employee_id: report.employee_id,
            issues: report.issues,
            checked_at: report.checked_at,
        })
    }

    /// container.repair.v1
    pub async fn container_repair(
        &self,
        params: ContainerRepairRequest,
    ) -> Result<ContainerRepairResponse, ErrorObjectOwned> {
        self.check_rate()?;

        let outcome = self
            .deps
            .health_checker
            .repair(&params.employee_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(ContainerRepairResponse {
            employee_id: outcome.employee_id,
            created_dirs: outcome.created_dirs,
            metadata_rebuilt: outcome.metadata_rebuilt,
            repaired_at: outcome.repaired_at,
        })
    }

    /// export.run.v1
    pub async fn export_run(
        &self,
        params: ExportRunRequest,
    ) -> Result<ExportRunResponse, ErrorObjectOwned> {
        self.check_rate()?;

        let dataset: ExportDataset = params
            .dataset
            .parse()
            .map_err(|e: String| to_rpc_error(AppError::Validation(e)))?;
        let format: ExportFormat = params
            .format
            .parse()
            .map_err(|e: String| to_rpc_error(AppError::Validation(e)))?;

        let outcome = self
            .deps
            .exports
            .run(dataset, format)
            .await
            .map_err(to_rpc_error)?;

        Ok(ExportRunResponse {
            dataset: outcome.dataset.to_string(),
            format: outcome.format.extension().to_string(),
            path: outcome.path,
            rows: outcome.rows,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let active_employees = self
            .deps
            .employee_repo
            .count_by_status(EmploymentStatus::Active)
            .await
            .map_err(to_rpc_error)?;

        let active_certificates = self
            .deps
            .certificate_repo
            .count_by_status(CertificateStatus::Active)
            .await
            .map_err(to_rpc_error)?;

        let expiring_soon_certificates = self
            .deps
            .certificate_repo
            .count_by_status(CertificateStatus::ExpiringSoon)
            .await
            .map_err(to_rpc_error)?;

        let expired_certificates = self
            .deps
            .certificate_repo
            .count_by_status(CertificateStatus::Expired)
            .await
            .map_err(to_rpc_error)?;

        let pending_notifications = self
            .deps
            .notification_repo
            .count_by_state(DispatchState::Pending)
            .await
            .map_err(to_rpc_error)?;

        let db_stats = self
            .deps
            .maintenance
            .get_stats()
            .await
            .map_err(to_rpc_error)?;

        let storage = self.deps.storage_probe.get_metrics().await;

        Ok(StatsResponse {
            active_employees,
            active_certificates,
            expiring_soon_certificates,
            expired_certificates,
            pending_notifications,
            db_size_bytes: db_stats.db_size_bytes,
            disk_used_gb: storage.disk_used_gb,
            disk_total_gb: storage.disk_total_gb,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(
        &self,
        params: MaintenanceRequest,
    ) -> Result<MaintenanceResponse, ErrorObjectOwned> {
        self.check_rate()?;

        // Full run goes through the schedule runner so it cannot overlap
        // with the periodic loop
        let stats = self
            .deps
            .schedule
            .run_maintenance()
            .await
            .map_err(to_rpc_error)?;

        let (vacuum_run, reclaimed_mb) = if params.force_vacuum {
            let reclaimed = self
                .deps
                .maintenance
                .vacuum()
                .await
                .map_err(to_rpc_error)?;
            (true, reclaimed)
        } else {
            (false, 0.0)
        };

        Ok(MaintenanceResponse {
            vacuum_run,
            reclaimed_mb,
            db_size_mb: stats.db_size_mb,
            notification_count: stats.notification_count,
            pending_notifications: stats.pending_notifications,
            fragmentation_percent: stats.fragmentation_percent,
        })
    }
}
