// DB Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Database maintenance statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub employee_count: i64,
    pub certificate_count: i64,
    pub notification_count: i64,
    pub pending_notifications: i64,
    pub fragmentation_percent: f64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for SENT/FAILED notifications (days)
    pub notification_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,

    /// Backup snapshot retention (days)
    pub backup_retention_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            notification_retention_days: 90, // Keep the dispatch trail for a quarter
            max_db_size_mb: 500.0,
            backup_retention_days: 14,
        }
    }
}

/// Database maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space and optimize DB
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete SENT/FAILED notifications older than retention period
    ///
    /// # Returns
    /// Number of notifications deleted
    async fn gc_notifications(&self, retention_days: i64) -> Result<i64>;

    /// Copy the database file into a timestamped snapshot and prune
    /// snapshots older than retention
    ///
    /// # Returns
    /// Path of the snapshot written
    async fn snapshot_db(&self, retention_days: i64) -> Result<String>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (GC + backup + conditional VACUUM)
    async fn run_full_maintenance(&self, config: &MaintenanceConfig) -> Result<MaintenanceStats> {
        let stats_before = self.get_stats().await?;

        let deleted = self
            .gc_notifications(config.notification_retention_days)
            .await?;

        let snapshot = self.snapshot_db(config.backup_retention_days).await?;

        let reclaimed_mb = if stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let stats_after = self.get_stats().await?;

        tracing::info!(
            deleted_notifications = deleted,
            snapshot = %snapshot,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats_after.db_size_mb,
            "Maintenance completed"
        );

        Ok(stats_after)
    }
}
