//! Status policy - derives a certificate's lifecycle state from its expiry
//! date and the warning window.
//!
//! The stored status column is a cache; this derivation is the source of
//! truth. Terminal states (SUPERSEDED, REVOKED) are never rewritten.

use crate::domain::{Certificate, CertificateStatus, TrainingType};
use chrono::NaiveDate;

/// Global default warning window (days before expiry)
pub const DEFAULT_WARNING_WINDOW_DAYS: i64 = 30;

/// Warning-window configuration + pure status derivation
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    warning_window_days: i64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_WINDOW_DAYS)
    }
}

impl StatusPolicy {
    pub fn new(warning_window_days: i64) -> Self {
        Self {
            warning_window_days,
        }
    }

    pub fn warning_window_days(&self) -> i64 {
        self.warning_window_days
    }

    /// Effective window for a certificate, honoring the per-type override
    pub fn window_for(&self, training_type: Option<&TrainingType>) -> i64 {
        training_type
            .and_then(|t| t.warning_window_days)
            .unwrap_or(self.warning_window_days)
    }

    /// Derive the date-based status
    ///
    /// - EXPIRED      iff expiry < today
    /// - EXPIRING_SOON iff today <= expiry <= today + window
    /// - ACTIVE       otherwise (including no expiry date)
    pub fn derive(
        &self,
        expiry_date: Option<NaiveDate>,
        today: NaiveDate,
        window_days: i64,
    ) -> CertificateStatus {
        match expiry_date {
            None => CertificateStatus::Active,
            Some(expiry) => {
                if expiry < today {
                    CertificateStatus::Expired
                } else if expiry <= today + chrono::Duration::days(window_days) {
                    CertificateStatus::ExpiringSoon
                } else {
                    CertificateStatus::Active
                }
            }
        }
    }

    /// Derive with the default window
    pub fn derive_default(&self, expiry_date: Option<NaiveDate>, today: NaiveDate) -> CertificateStatus {
        self.derive(expiry_date, today, self.warning_window_days)
    }

    /// Compute the derived status and apply it to the certificate if it
    /// drifted. Returns true when the stored status changed.
    ///
    /// Terminal certificates are left untouched.
    pub fn refresh(
        &self,
        certificate: &mut Certificate,
        today: NaiveDate,
        now_millis: i64,
        window_days: i64,
    ) -> crate::domain::error::Result<bool> {
        if certificate.status.is_terminal() {
            return Ok(false);
        }
        let derived = self.derive(certificate.expiry_date, today, window_days);
        if derived == certificate.status {
            return Ok(false);
        }
        certificate.apply_derived_status(derived, now_millis)?;
        Ok(true)
    }
}
