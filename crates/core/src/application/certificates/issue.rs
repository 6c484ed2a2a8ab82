// Issue Use Case

use crate::application::status::StatusPolicy;
use crate::domain::{Certificate, TrainingType, VerificationCode};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider, TransactionalCertificateRepository};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Issue request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    pub employee_id: String,
    pub training_type_code: String,
    pub issue_date: NaiveDate,

    /// Explicit expiry; when absent it is computed from the training
    /// type's validity_months (no expiry if the type has none either)
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,

    #[serde(default)]
    pub provider: Option<String>,
}

/// Execute issue use case (with transaction for atomicity)
///
/// The generation bump, the insert and the supersede of older series
/// members commit together or not at all.
pub async fn execute(
    transactional_repo: &dyn TransactionalCertificateRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    status_policy: &StatusPolicy,
    training_type: &TrainingType,
    req: IssueRequest,
) -> Result<Certificate> {
    let expiry_date = resolve_expiry(&req, training_type)?;

    // Start transaction to prevent generation conflicts
    let mut tx = transactional_repo.begin_transaction().await?;

    // Reserve the next generation for this series (within transaction)
    let generation = tx
        .next_generation(&req.employee_id, &training_type.id)
        .await?;

    let certificate_id = id_provider.generate_id();
    let created_at = time_provider.now_millis();

    let mut certificate = Certificate::new(
        certificate_id,
        created_at,
        req.employee_id.clone(),
        training_type.id.clone(),
        generation,
        VerificationCode::new(id_provider.generate_verification_code()),
        req.issue_date,
        expiry_date,
    )?;
    certificate.provider = req.provider;

    // A back-dated issue may already be inside the warning window
    let window = status_policy.window_for(Some(training_type));
    let derived = status_policy.derive(certificate.expiry_date, time_provider.today(), window);
    certificate.apply_derived_status(derived, created_at)?;

    // Insert certificate (within transaction)
    tx.insert(&certificate).await?;

    // Mark older generations as superseded (within transaction)
    let superseded = tx
        .supersede_older(&req.employee_id, &training_type.id, generation)
        .await?;

    tx.commit().await?;

    info!(
        certificate_id = %certificate.id,
        employee_id = %certificate.employee_id,
        training_type = %training_type.code,
        generation = generation,
        superseded = superseded,
        "Certificate issued"
    );

    Ok(certificate)
}

fn resolve_expiry(req: &IssueRequest, training_type: &TrainingType) -> Result<Option<NaiveDate>> {
    if let Some(expiry) = req.expiry_date {
        return Ok(Some(expiry));
    }
    match training_type.validity_months {
        None => Ok(None),
        Some(months) => req
            .issue_date
            .checked_add_months(Months::new(months))
            .map(Some)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Cannot compute expiry for issue date {}",
                    req.issue_date
                ))
            }),
    }
}
