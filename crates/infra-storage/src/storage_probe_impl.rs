// Storage probe implementation using sysinfo

use async_trait::async_trait;
use credent_core::port::{StorageMetrics, StorageProbe};
use std::path::PathBuf;
use sysinfo::Disks;
use tracing::debug;

/// Reads disk capacity for the filesystem holding the data directory.
/// Falls back to the first disk when no mount point matches.
pub struct StorageProbeImpl {
    data_root: PathBuf,
}

impl StorageProbeImpl {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }
}

#[async_trait]
impl StorageProbe for StorageProbeImpl {
    async fn get_metrics(&self) -> StorageMetrics {
        let disks = Disks::new_with_refreshed_list();

        // Longest mount point that prefixes the data root wins
        let matching = disks
            .iter()
            .filter(|d| self.data_root.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .or_else(|| disks.first());

        let (disk_used_gb, disk_total_gb) = match matching {
            Some(disk) => {
                let total = disk.total_space() / 1024 / 1024 / 1024;
                let available = disk.available_space() / 1024 / 1024 / 1024;
                (total - available, total)
            }
            None => (0, 0),
        };

        debug!(
            disk_used_gb = %disk_used_gb,
            disk_total_gb = %disk_total_gb,
            "Storage metrics collected"
        );

        StorageMetrics {
            disk_used_gb,
            disk_total_gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_metrics() {
        let probe = StorageProbeImpl::new("/");
        let metrics = probe.get_metrics().await;

        assert!(metrics.disk_total_gb >= metrics.disk_used_gb);
        assert!(metrics.used_percent() >= 0.0);
        assert!(metrics.used_percent() <= 100.0);
    }
}
