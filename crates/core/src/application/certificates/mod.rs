// Certificate Use Cases

pub mod issue;

use crate::application::status::StatusPolicy;
use crate::domain::{Certificate, CertificateId, TrainingType};
use crate::error::{AppError, Result};
use crate::port::{
    CertificateRepository, IdProvider, TimeProvider, TrainingTypeRepository,
    TransactionalCertificateRepository,
};
use std::sync::Arc;
use tracing::info;

pub use issue::IssueRequest;

/// Certificate lifecycle service
///
/// Issue goes through a transaction so the generation bump and the
/// supersede of older series members are atomic.
pub struct CertificateService {
    certificate_repo: Arc<dyn CertificateRepository>,
    transactional_repo: Arc<dyn TransactionalCertificateRepository>,
    training_type_repo: Arc<dyn TrainingTypeRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    status_policy: StatusPolicy,
}

impl CertificateService {
    pub fn new(
        certificate_repo: Arc<dyn CertificateRepository>,
        transactional_repo: Arc<dyn TransactionalCertificateRepository>,
        training_type_repo: Arc<dyn TrainingTypeRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        status_policy: StatusPolicy,
    ) -> Self {
        Self {
            certificate_repo,
            transactional_repo,
            training_type_repo,
            id_provider,
            time_provider,
            status_policy,
        }
    }

    /// Issue a certificate, superseding older ones in the same series
    pub async fn issue(&self, req: IssueRequest) -> Result<Certificate> {
        let training_type = self.resolve_training_type(&req.training_type_code).await?;

        issue::execute(
            self.transactional_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            &self.status_policy,
            &training_type,
            req,
        )
        .await
    }

    /// Revoke a certificate (terminal, cannot be undone)
    pub async fn revoke(&self, certificate_id: &CertificateId) -> Result<Certificate> {
        let mut certificate = self
            .certificate_repo
            .find_by_id(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))?;

        certificate.revoke(self.time_provider.now_millis())?;
        self.certificate_repo.update(&certificate).await?;

        info!(certificate_id = %certificate.id, "Certificate revoked");
        Ok(certificate)
    }

    /// Fetch a certificate by ID
    pub async fn get(&self, certificate_id: &CertificateId) -> Result<Certificate> {
        self.certificate_repo
            .find_by_id(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))
    }

    /// Current (latest-generation, non-terminal) certificates for an employee
    pub async fn current_for(&self, employee_id: &str) -> Result<Vec<Certificate>> {
        self.certificate_repo
            .find_current_for(&employee_id.to_string())
            .await
    }

    async fn resolve_training_type(&self, code: &str) -> Result<TrainingType> {
        self.training_type_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Training type {}", code)))
    }
}
