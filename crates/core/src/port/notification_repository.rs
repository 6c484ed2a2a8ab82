// Notification Repository Port (Interface)

use crate::domain::{DispatchState, Notification, NotificationId, NotificationKind};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Notification persistence
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new notification
    async fn insert(&self, notification: &Notification) -> Result<()>;

    /// Update a notification
    async fn update(&self, notification: &Notification) -> Result<()>;

    /// Find by ID
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>>;

    /// PENDING notifications whose next_attempt_at is unset or has passed
    async fn find_due_pending(&self, now_millis: i64, limit: i64) -> Result<Vec<Notification>>;

    /// Dedupe check: was a notification of this kind created for this
    /// certificate at or after `since_millis`?
    async fn exists_recent(
        &self,
        certificate_id: &str,
        kind: NotificationKind,
        since_millis: i64,
    ) -> Result<bool>;

    /// Count notifications by delivery state
    async fn count_by_state(&self, state: DispatchState) -> Result<i64>;

    /// Most recent notifications, newest first
    async fn list_recent(&self, limit: i64) -> Result<Vec<Notification>>;
}
