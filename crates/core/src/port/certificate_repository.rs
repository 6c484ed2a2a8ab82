// Certificate Repository Port (Interface)

use crate::domain::{Certificate, CertificateId, CertificateStatus, EmployeeId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository interface for Certificate persistence
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Insert a new certificate
    async fn insert(&self, certificate: &Certificate) -> Result<()>;

    /// Update a certificate
    async fn update(&self, certificate: &Certificate) -> Result<()>;

    /// Find certificate by ID
    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>>;

    /// Current certificates for an employee: latest generation per series,
    /// excluding terminal states
    async fn find_current_for(&self, employee_id: &EmployeeId) -> Result<Vec<Certificate>>;

    /// Non-terminal certificates with an expiry date inside [from, to]
    async fn find_expiring_between(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<Certificate>>;

    /// Non-terminal certificates whose expiry date has passed but whose
    /// stored status is not yet EXPIRED
    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Certificate>>;

    /// All certificates not in a terminal state (for startup reconciliation)
    async fn find_non_terminal(&self) -> Result<Vec<Certificate>>;

    /// Update only the stored status. Guarded: terminal rows are never
    /// rewritten; returns Conflict/NotFound accordingly.
    async fn update_status(
        &self,
        id: &CertificateId,
        status: CertificateStatus,
        now_millis: i64,
    ) -> Result<()>;

    /// Count certificates by stored status
    async fn count_by_status(&self, status: CertificateStatus) -> Result<i64>;

    /// All certificates (export)
    async fn list_all(&self) -> Result<Vec<Certificate>>;
}
