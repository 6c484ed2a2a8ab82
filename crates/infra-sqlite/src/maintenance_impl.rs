// SQLite Maintenance Implementation

use crate::error_map::map_sqlx_error;
use async_trait::async_trait;
use credent_core::error::{AppError, Result};
use credent_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

const DAY_MS: i64 = 86_400_000;

pub struct SqliteMaintenance {
    pool: SqlitePool,
    backup_dir: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, backup_dir: PathBuf, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            backup_dir,
            time_provider,
        }
    }

    async fn db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(page_count * page_size)
    }

    async fn prune_old_snapshots(&self, retention_days: i64) -> Result<usize> {
        let mut pruned = 0;
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_millis((retention_days * DAY_MS) as u64));
        let Some(cutoff) = cutoff else {
            return Ok(0);
        };

        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("snapshot_") || !name.ends_with(".db") {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if modified < cutoff {
                if tokio::fs::remove_file(entry.path()).await.is_ok() {
                    debug!(snapshot = %name, "Pruned expired snapshot");
                    pruned += 1;
                }
            }
        }

        Ok(pruned)
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        let before = self.db_size_bytes().await?;

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let after = self.db_size_bytes().await?;
        let reclaimed_mb = (before - after).max(0) as f64 / 1_048_576.0;

        info!(
            before_bytes = before,
            after_bytes = after,
            reclaimed_mb = reclaimed_mb,
            "VACUUM completed"
        );

        Ok(reclaimed_mb)
    }

    async fn gc_notifications(&self, retention_days: i64) -> Result<i64> {
        let cutoff = self.time_provider.now_millis() - retention_days * DAY_MS;

        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE state IN ('SENT', 'FAILED') AND created_at < ?
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let deleted = result.rows_affected() as i64;
        if deleted > 0 {
            info!(deleted = deleted, cutoff = cutoff, "Notification GC completed");
        }

        Ok(deleted)
    }

    async fn snapshot_db(&self, retention_days: i64) -> Result<String> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Cannot create backup dir {}: {}",
                    self.backup_dir.display(),
                    e
                ))
            })?;

        let now = self.time_provider.now_millis();
        let stamp = chrono::DateTime::from_timestamp_millis(now)
            .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
            .unwrap_or_else(|| now.to_string());
        let path = self.backup_dir.join(format!("snapshot_{}.db", stamp));
        let path_str = path.to_string_lossy().to_string();

        // VACUUM INTO writes a consistent, defragmented copy without
        // blocking readers
        sqlx::query(&format!("VACUUM INTO '{}'", path_str.replace('\'', "''")))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let pruned = self.prune_old_snapshots(retention_days).await?;
        info!(snapshot = %path_str, pruned = pruned, "Snapshot written");

        Ok(path_str)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_bytes = self.db_size_bytes().await?;

        let employee_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let certificate_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let notification_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let pending_notifications: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE state = 'PENDING'")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let fragmentation_percent = if page_count > 0 {
            freelist_count as f64 / page_count as f64 * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_mb: db_size_bytes as f64 / 1_048_576.0,
            db_size_bytes,
            employee_count,
            certificate_count,
            notification_count,
            pending_notifications,
            fragmentation_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteNotificationRepository};
    use credent_core::domain::{DispatchState, Notification, NotificationKind};
    use credent_core::port::time_provider::mocks::MockTimeProvider;
    use credent_core::port::NotificationRepository;

    async fn setup(backup_dir: PathBuf, now: i64) -> (SqlitePool, SqliteMaintenance) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let maintenance = SqliteMaintenance::new(
            pool.clone(),
            backup_dir,
            Arc::new(MockTimeProvider::new(now)),
        );
        (pool, maintenance)
    }

    #[tokio::test]
    async fn test_gc_deletes_only_old_settled_notifications() {
        let now = 100 * DAY_MS;
        let tmp = tempfile::tempdir().unwrap();
        let (pool, maintenance) = setup(tmp.path().to_path_buf(), now).await;
        let repo = SqliteNotificationRepository::new(pool);

        // Old and SENT: collected
        let mut old_sent = Notification::new_test("emp-1", NotificationKind::ExpiryWarning);
        old_sent.created_at = now - 91 * DAY_MS;
        old_sent.mark_sent(old_sent.created_at);
        repo.insert(&old_sent).await.unwrap();

        // Old but still PENDING: kept
        let mut old_pending = Notification::new_test("emp-1", NotificationKind::Expired);
        old_pending.created_at = now - 91 * DAY_MS;
        repo.insert(&old_pending).await.unwrap();

        // Recent and SENT: kept
        let mut fresh_sent = Notification::new_test("emp-1", NotificationKind::ComplianceAlert);
        fresh_sent.created_at = now - 10 * DAY_MS;
        fresh_sent.mark_sent(fresh_sent.created_at);
        repo.insert(&fresh_sent).await.unwrap();

        let deleted = maintenance.gc_notifications(90).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(repo.find_by_id(&old_sent.id).await.unwrap().is_none());
        assert!(repo.find_by_id(&old_pending.id).await.unwrap().is_some());
        assert!(repo.find_by_id(&fresh_sent.id).await.unwrap().is_some());
        assert_eq!(repo.count_by_state(DispatchState::Sent).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (_pool, maintenance) = setup(tmp.path().to_path_buf(), 1_700_000_000_000).await;

        let path = maintenance.snapshot_db(14).await.unwrap();
        assert!(std::path::Path::new(&path).exists());

        let name = std::path::Path::new(&path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(name.starts_with("snapshot_"));
        assert!(name.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_stats_reflect_row_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let (pool, maintenance) = setup(tmp.path().to_path_buf(), 1_700_000_000_000).await;
        let repo = SqliteNotificationRepository::new(pool);

        repo.insert(&Notification::new_test("emp-1", NotificationKind::ExpiryWarning))
            .await
            .unwrap();

        let stats = maintenance.get_stats().await.unwrap();
        assert_eq!(stats.notification_count, 1);
        assert_eq!(stats.pending_notifications, 1);
        assert_eq!(stats.employee_count, 0);
        assert!(stats.db_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_vacuum_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let (_pool, maintenance) = setup(tmp.path().to_path_buf(), 1_700_000_000_000).await;

        let reclaimed = maintenance.vacuum().await.unwrap();
        assert!(reclaimed >= 0.0);
    }
}
