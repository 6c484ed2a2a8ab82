// Certificate Domain Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Certificate ID (UUID v4)
pub type CertificateId = String;

/// Generation within a series (for renewal supersede logic)
pub type Generation = i64;

/// Certificate lifecycle state
///
/// ACTIVE <-> EXPIRING_SOON -> EXPIRED are derived from the expiry date.
/// SUPERSEDED and REVOKED are terminal and never rewritten by derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Active,
    ExpiringSoon,
    Expired,
    Superseded,
    Revoked,
}

impl CertificateStatus {
    /// Terminal states are never overwritten by date derivation
    pub fn is_terminal(&self) -> bool {
        matches!(self, CertificateStatus::Superseded | CertificateStatus::Revoked)
    }

    /// A certificate in this state still counts towards compliance
    pub fn is_valid(&self) -> bool {
        matches!(self, CertificateStatus::Active | CertificateStatus::ExpiringSoon)
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateStatus::Active => write!(f, "ACTIVE"),
            CertificateStatus::ExpiringSoon => write!(f, "EXPIRING_SOON"),
            CertificateStatus::Expired => write!(f, "EXPIRED"),
            CertificateStatus::Superseded => write!(f, "SUPERSEDED"),
            CertificateStatus::Revoked => write!(f, "REVOKED"),
        }
    }
}

impl std::str::FromStr for CertificateStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CertificateStatus::Active),
            "EXPIRING_SOON" => Ok(CertificateStatus::ExpiringSoon),
            "EXPIRED" => Ok(CertificateStatus::Expired),
            "SUPERSEDED" => Ok(CertificateStatus::Superseded),
            "REVOKED" => Ok(CertificateStatus::Revoked),
            other => Err(format!("Unknown certificate status: {}", other)),
        }
    }
}

/// Verification code printed on the certificate document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Certificate Entity
///
/// A certificate belongs to a series keyed by (employee_id, training_type_id).
/// Issuing a renewal bumps the series generation; older non-terminal
/// certificates of the same series are marked SUPERSEDED atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub employee_id: String,
    pub training_type_id: String,
    pub generation: Generation,

    pub provider: Option<String>,
    pub verification_code: VerificationCode,

    pub issue_date: NaiveDate,
    /// None means the certification never lapses
    pub expiry_date: Option<NaiveDate>,

    pub status: CertificateStatus,

    pub created_at: i64, // epoch ms
    pub status_updated_at: Option<i64>,
    pub revoked_at: Option<i64>,
}

impl Certificate {
    /// Create a new ACTIVE certificate
    ///
    /// # Arguments
    ///
    /// * `id` - Unique certificate ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `generation` - Series generation (assigned by the issue transaction)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        employee_id: impl Into<String>,
        training_type_id: impl Into<String>,
        generation: Generation,
        verification_code: VerificationCode,
        issue_date: NaiveDate,
        expiry_date: Option<NaiveDate>,
    ) -> crate::domain::error::Result<Self> {
        if let Some(expiry) = expiry_date {
            if expiry < issue_date {
                return Err(crate::domain::error::DomainError::InvalidDateRange {
                    issue: issue_date.to_string(),
                    expiry: expiry.to_string(),
                });
            }
        }

        Ok(Self {
            id: id.into(),
            employee_id: employee_id.into(),
            training_type_id: training_type_id.into(),
            generation,
            provider: None,
            verification_code,
            issue_date,
            expiry_date,
            status: CertificateStatus::Active,
            created_at,
            status_updated_at: None,
            revoked_at: None,
        })
    }

    /// Apply a date-derived status with explicit timestamp
    ///
    /// Only ACTIVE <-> EXPIRING_SOON -> EXPIRED moves are legal; terminal
    /// states reject any derivation.
    pub fn apply_derived_status(
        &mut self,
        derived: CertificateStatus,
        now_millis: i64,
    ) -> crate::domain::error::Result<()> {
        if self.status == derived {
            return Ok(());
        }
        let legal = match (self.status, derived) {
            (CertificateStatus::Active, CertificateStatus::ExpiringSoon) => true,
            (CertificateStatus::Active, CertificateStatus::Expired) => true,
            (CertificateStatus::ExpiringSoon, CertificateStatus::Expired) => true,
            // Expiry date pushed out (data correction)
            (CertificateStatus::ExpiringSoon, CertificateStatus::Active) => true,
            (CertificateStatus::Expired, CertificateStatus::Active) => true,
            (CertificateStatus::Expired, CertificateStatus::ExpiringSoon) => true,
            _ => false,
        };
        if !legal {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: derived.to_string(),
            });
        }
        self.status = derived;
        self.status_updated_at = Some(now_millis);
        Ok(())
    }

    /// Mark as SUPERSEDED (renewal issued) with explicit timestamp
    pub fn supersede(&mut self, now_millis: i64) {
        self.status = CertificateStatus::Superseded;
        self.status_updated_at = Some(now_millis);
    }

    /// Revoke the certificate with explicit timestamp
    pub fn revoke(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status.is_terminal() {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: CertificateStatus::Revoked.to_string(),
            });
        }
        self.status = CertificateStatus::Revoked;
        self.status_updated_at = Some(now_millis);
        self.revoked_at = Some(now_millis);
        Ok(())
    }
}

impl Certificate {
    /// Create a test certificate with deterministic ID and timestamp.
    ///
    /// Uses a simple counter for deterministic test IDs (cert-1, cert-2, ...).
    /// Timestamps start at 1000 and increment by 1000.
    ///
    /// **Note**: This method should only be used in tests. For production code,
    /// always inject ID and time via providers.
    pub fn new_test(
        employee_id: impl Into<String>,
        training_type_id: impl Into<String>,
        generation: Generation,
        issue_date: NaiveDate,
        expiry_date: Option<NaiveDate>,
    ) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let id = format!("cert-{}", counter);
        let created_at = (counter * 1000) as i64;

        Self::new(
            id.clone(),
            created_at,
            employee_id,
            training_type_id,
            generation,
            VerificationCode::new(format!("VC-{}", counter)),
            issue_date,
            expiry_date,
        )
        .expect("test certificate dates must be valid")
    }
}
