// Storage probe port
// Disk capacity readings for health reports and admin stats

use async_trait::async_trait;

/// Disk metrics for the data directory's filesystem
#[derive(Debug, Clone)]
pub struct StorageMetrics {
    pub disk_used_gb: u64,
    pub disk_total_gb: u64,
}

impl StorageMetrics {
    pub fn used_percent(&self) -> f64 {
        if self.disk_total_gb == 0 {
            return 0.0;
        }
        (self.disk_used_gb as f64 / self.disk_total_gb as f64) * 100.0
    }
}

/// Storage probe port
#[async_trait]
pub trait StorageProbe: Send + Sync {
    /// Get current disk metrics
    async fn get_metrics(&self) -> StorageMetrics;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Mock StorageProbe for testing
    pub struct MockStorageProbe {
        used_gb: u64,
        total_gb: u64,
    }

    impl MockStorageProbe {
        pub fn new(used_gb: u64, total_gb: u64) -> Self {
            Self { used_gb, total_gb }
        }
    }

    #[async_trait]
    impl StorageProbe for MockStorageProbe {
        async fn get_metrics(&self) -> StorageMetrics {
            StorageMetrics {
                disk_used_gb: self.used_gb,
                disk_total_gb: self.total_gb,
            }
        }
    }
}
