//! Compliance audit - recomputes every auditable employee's compliance
//! status and caches it on the employee row.

use crate::application::compliance::ComplianceService;
use crate::domain::{ComplianceStatus, Notification, NotificationKind};
use crate::error::Result;
use crate::port::{EmployeeRepository, IdProvider, NotificationRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Counters from one audit pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub evaluated: usize,
    pub compliant: usize,
    pub at_risk: usize,
    pub non_compliant: usize,
    /// Employees whose cached status changed this pass
    pub changed: usize,
}

/// Periodic whole-roster compliance audit
pub struct ComplianceAuditor {
    employee_repo: Arc<dyn EmployeeRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    compliance: Arc<ComplianceService>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ComplianceAuditor {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        compliance: Arc<ComplianceService>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            employee_repo,
            notification_repo,
            compliance,
            id_provider,
            time_provider,
        }
    }

    /// Audit the whole roster. Terminated employees are skipped; an
    /// employee dropping to NON_COMPLIANT queues a COMPLIANCE_ALERT.
    pub async fn run(&self) -> Result<AuditStats> {
        let now = self.time_provider.now_millis();
        let employees = self.employee_repo.list(None).await?;

        let mut stats = AuditStats::default();

        for employee in employees.iter().filter(|e| e.is_auditable()) {
            let report = self.compliance.evaluate(employee).await?;
            stats.evaluated += 1;
            match report.status {
                ComplianceStatus::Compliant => stats.compliant += 1,
                ComplianceStatus::AtRisk => stats.at_risk += 1,
                ComplianceStatus::NonCompliant => stats.non_compliant += 1,
            }

            if employee.compliance_status == Some(report.status) {
                continue;
            }

            self.employee_repo
                .update_compliance(&employee.id, report.status, now)
                .await?;
            stats.changed += 1;

            if report.status == ComplianceStatus::NonCompliant {
                warn!(
                    employee_id = %employee.id,
                    missing = ?report.missing,
                    "Employee is non-compliant"
                );
                let notification = Notification::new(
                    self.id_provider.generate_id(),
                    now,
                    employee.id.clone(),
                    NotificationKind::ComplianceAlert,
                    "Training compliance lapsed".to_string(),
                    format!(
                        "Hello {},\n\nYou are missing valid certification for: {}. \
                         Please arrange the required training.",
                        employee.full_name,
                        report.missing.join(", "),
                    ),
                );
                self.notification_repo.insert(&notification).await?;
            }
        }

        info!(
            evaluated = stats.evaluated,
            compliant = stats.compliant,
            at_risk = stats.at_risk,
            non_compliant = stats.non_compliant,
            changed = stats.changed,
            "Compliance audit completed"
        );

        Ok(stats)
    }
}
