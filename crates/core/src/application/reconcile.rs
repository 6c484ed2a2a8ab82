// Startup status reconciliation

use crate::application::status::StatusPolicy;
use crate::error::Result;
use crate::port::{CertificateRepository, TimeProvider, TrainingTypeRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Startup reconciler
///
/// The stored status column drifts while the daemon is down (dates keep
/// passing). On startup every non-terminal certificate is re-derived and
/// drifted rows are rewritten, so the API never serves stale statuses.
pub struct StatusReconciler {
    certificate_repo: Arc<dyn CertificateRepository>,
    training_type_repo: Arc<dyn TrainingTypeRepository>,
    status_policy: StatusPolicy,
    time_provider: Arc<dyn TimeProvider>,
}

impl StatusReconciler {
    pub fn new(
        certificate_repo: Arc<dyn CertificateRepository>,
        training_type_repo: Arc<dyn TrainingTypeRepository>,
        status_policy: StatusPolicy,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            certificate_repo,
            training_type_repo,
            status_policy,
            time_provider,
        }
    }

    /// Re-derive every non-terminal certificate status
    ///
    /// # Returns
    /// Number of certificates whose stored status was corrected
    pub async fn reconcile(&self) -> Result<usize> {
        let today = self.time_provider.today();
        let now = self.time_provider.now_millis();

        let windows: HashMap<String, i64> = self
            .training_type_repo
            .list()
            .await?
            .into_iter()
            .map(|t| {
                let window = self.status_policy.window_for(Some(&t));
                (t.id, window)
            })
            .collect();

        let certificates = self.certificate_repo.find_non_terminal().await?;
        let scanned = certificates.len();
        let mut corrected = 0;

        for mut certificate in certificates {
            let window = windows
                .get(&certificate.training_type_id)
                .copied()
                .unwrap_or_else(|| self.status_policy.warning_window_days());

            if self
                .status_policy
                .refresh(&mut certificate, today, now, window)?
            {
                self.certificate_repo.update(&certificate).await?;
                corrected += 1;
            }
        }

        info!(
            scanned = scanned,
            corrected = corrected,
            "Status reconciliation complete"
        );
        Ok(corrected)
    }
}
