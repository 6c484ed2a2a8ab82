// SQLite NotificationRepository Implementation

use crate::error_map::map_sqlx_error;
use async_trait::async_trait;
use credent_core::domain::{DispatchState, Notification, NotificationId, NotificationKind};
use credent_core::error::Result;
use credent_core::port::NotificationRepository;
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, employee_id, certificate_id, kind, state,
                subject, body, attempts, max_attempts, backoff_factor,
                next_attempt_at, created_at, sent_at, last_error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.employee_id)
        .bind(&notification.certificate_id)
        .bind(notification.kind.to_string())
        .bind(notification.state.to_string())
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(notification.attempts)
        .bind(notification.max_attempts)
        .bind(notification.backoff_factor)
        .bind(notification.next_attempt_at)
        .bind(notification.created_at)
        .bind(notification.sent_at)
        .bind(&notification.last_error)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET state = ?, attempts = ?, next_attempt_at = ?,
                sent_at = ?, last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(notification.state.to_string())
        .bind(notification.attempts)
        .bind(notification.next_attempt_at)
        .bind(notification.sent_at)
        .bind(&notification.last_error)
        .bind(&notification.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_notification()))
    }

    async fn find_due_pending(&self, now_millis: i64, limit: i64) -> Result<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE state = 'PENDING'
              AND (next_attempt_at IS NULL OR next_attempt_at <= ?)
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(now_millis)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_notification()).collect())
    }

    async fn exists_recent(
        &self,
        certificate_id: &str,
        kind: NotificationKind,
        since_millis: i64,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE certificate_id = ? AND kind = ? AND created_at >= ?
            "#,
        )
        .bind(certificate_id)
        .bind(kind.to_string())
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }

    async fn count_by_state(&self, state: DispatchState) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE state = ?")
            .bind(state.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Notification>> {
        let rows: Vec<NotificationRow> =
            sqlx::query_as("SELECT * FROM notifications ORDER BY created_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_notification()).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: String,
    employee_id: String,
    certificate_id: Option<String>,
    kind: String,
    state: String,
    subject: String,
    body: String,
    attempts: i32,
    max_attempts: i32,
    backoff_factor: f64,
    next_attempt_at: Option<i64>,
    created_at: i64,
    sent_at: Option<i64>,
    last_error: Option<String>,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        let kind = NotificationKind::from_str(&self.kind).unwrap_or(NotificationKind::TaskFailure);
        let state = DispatchState::from_str(&self.state).unwrap_or(DispatchState::Failed);

        Notification {
            id: self.id,
            employee_id: self.employee_id,
            certificate_id: self.certificate_id,
            kind,
            state,
            subject: self.subject,
            body: self.body,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            backoff_factor: self.backoff_factor,
            next_attempt_at: self.next_attempt_at,
            created_at: self.created_at,
            sent_at: self.sent_at,
            last_error: self.last_error,
        }
    }
}
