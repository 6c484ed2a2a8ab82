// Schedule defaults

/// Expiry scan + delivery pass (hourly)
pub const DEFAULT_DISPATCH_INTERVAL_SECS: u64 = 3600;

/// Whole-roster compliance audit (daily)
pub const DEFAULT_AUDIT_INTERVAL_SECS: u64 = 86_400;

/// Container health sweep (daily)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// DB maintenance (daily)
pub const DEFAULT_MAINTENANCE_INTERVAL_HOURS: u64 = 24;

/// Max notifications delivered per dispatch pass
pub const DEFAULT_DELIVERY_BATCH_SIZE: i64 = 100;

/// Base backoff delay for delivery retries (1 minute)
pub const DEFAULT_RETRY_BASE_DELAY_MS: i64 = 60_000;
