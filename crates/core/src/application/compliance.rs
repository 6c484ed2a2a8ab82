//! Compliance derivation - does an employee hold a valid certificate for
//! every mandatory training type?

use crate::application::status::StatusPolicy;
use crate::domain::{
    CertificateStatus, ComplianceReport, ComplianceStatus, ComplianceSummary, Employee,
    ExpiringEntry,
};
use crate::error::Result;
use crate::port::{CertificateRepository, EmployeeRepository, TimeProvider, TrainingTypeRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Compliance evaluation service
pub struct ComplianceService {
    employee_repo: Arc<dyn EmployeeRepository>,
    certificate_repo: Arc<dyn CertificateRepository>,
    training_type_repo: Arc<dyn TrainingTypeRepository>,
    status_policy: StatusPolicy,
    time_provider: Arc<dyn TimeProvider>,
}

impl ComplianceService {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        certificate_repo: Arc<dyn CertificateRepository>,
        training_type_repo: Arc<dyn TrainingTypeRepository>,
        status_policy: StatusPolicy,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            employee_repo,
            certificate_repo,
            training_type_repo,
            status_policy,
            time_provider,
        }
    }

    /// Evaluate one employee against all mandatory training types
    ///
    /// Derivation rules:
    /// - NON_COMPLIANT: any mandatory type with no certificate whose derived
    ///   status is ACTIVE or EXPIRING_SOON
    /// - AT_RISK: fully covered, but at least one covering certificate is
    ///   inside its warning window
    /// - COMPLIANT: otherwise (vacuously compliant with no mandatory types)
    pub async fn evaluate(&self, employee: &Employee) -> Result<ComplianceReport> {
        let now = self.time_provider.now_millis();
        let today = self.time_provider.today();

        let mandatory = self.training_type_repo.list_mandatory().await?;
        let current = self
            .certificate_repo
            .find_current_for(&employee.id)
            .await?;

        // Latest certificate per training type (find_current_for already
        // filters to latest-generation non-terminal rows)
        let by_type: HashMap<&str, &crate::domain::Certificate> = current
            .iter()
            .map(|c| (c.training_type_id.as_str(), c))
            .collect();

        let mut missing = Vec::new();
        let mut expiring = Vec::new();

        for training_type in &mandatory {
            let window = self.status_policy.window_for(Some(training_type));

            match by_type.get(training_type.id.as_str()) {
                None => missing.push(training_type.code.clone()),
                Some(cert) => {
                    match self.status_policy.derive(cert.expiry_date, today, window) {
                        CertificateStatus::Expired => missing.push(training_type.code.clone()),
                        CertificateStatus::ExpiringSoon => expiring.push(ExpiringEntry {
                            certificate_id: cert.id.clone(),
                            training_type_code: training_type.code.clone(),
                            // ExpiringSoon implies an expiry date is present
                            expiry_date: cert.expiry_date.unwrap_or(today),
                        }),
                        _ => {}
                    }
                }
            }
        }

        let status = if !missing.is_empty() {
            ComplianceStatus::NonCompliant
        } else if !expiring.is_empty() {
            ComplianceStatus::AtRisk
        } else {
            ComplianceStatus::Compliant
        };

        debug!(
            employee_id = %employee.id,
            status = %status,
            missing = missing.len(),
            expiring = expiring.len(),
            "Compliance evaluated"
        );

        Ok(ComplianceReport {
            employee_id: employee.id.clone(),
            status,
            missing,
            expiring,
            evaluated_at: now,
        })
    }

    /// Aggregate counts over all non-terminated employees
    pub async fn summary(&self) -> Result<ComplianceSummary> {
        let employees = self.employee_repo.list(None).await?;
        let mut summary = ComplianceSummary::default();

        for employee in employees.iter().filter(|e| e.is_auditable()) {
            let report = self.evaluate(employee).await?;
            summary.employees_evaluated += 1;
            match report.status {
                ComplianceStatus::Compliant => summary.compliant += 1,
                ComplianceStatus::AtRisk => summary.at_risk += 1,
                ComplianceStatus::NonCompliant => summary.non_compliant += 1,
            }
        }

        Ok(summary)
    }
}
