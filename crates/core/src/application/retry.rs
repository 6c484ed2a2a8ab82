// Delivery retry logic

use crate::domain::Notification;
use crate::port::TimeProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the delivery (with backoff delay in ms)
    Retry(i64),
    /// Do not retry, delivery has failed permanently
    Failed,
}

/// Retry policy for notification delivery
///
/// Determines if a failed delivery should be retried based on:
/// - Current attempt count
/// - Maximum attempts allowed
/// - Backoff factor for exponential delay
pub struct DispatchRetry {
    time_provider: Arc<dyn TimeProvider>,
    base_delay_ms: i64,
}

impl DispatchRetry {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for current time
    /// * `base_delay_ms` - Base delay in milliseconds (default: 60_000)
    pub fn new(time_provider: Arc<dyn TimeProvider>, base_delay_ms: i64) -> Self {
        Self {
            time_provider,
            base_delay_ms,
        }
    }

    /// Determine if a delivery should be retried
    ///
    /// Returns:
    /// - `RetryDecision::Retry(delay_ms)` if delivery should be retried with calculated backoff
    /// - `RetryDecision::Failed` if max attempts reached
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ attempts)
    pub fn should_retry(&self, notification: &Notification) -> RetryDecision {
        // attempts counts failures already recorded; the next send would be
        // attempt attempts+1
        if notification.attempts + 1 >= notification.max_attempts {
            warn!(
                notification_id = %notification.id,
                attempts = %notification.attempts,
                max_attempts = %notification.max_attempts,
                "Max delivery attempts reached"
            );
            return RetryDecision::Failed;
        }

        // Exponential backoff with deterministic +/-10% jitter to avoid
        // thundering-herd retries. Jitter is seeded from the notification id.
        let base_delay_ms =
            self.base_delay_ms as f64 * notification.backoff_factor.powi(notification.attempts);

        let jitter_seed = notification.id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base_delay_ms * jitter_factor) as i64;

        info!(
            notification_id = %notification.id,
            attempt = %notification.attempts,
            max_attempts = %notification.max_attempts,
            delay_ms = %delay_ms,
            "Scheduling delivery retry"
        );

        RetryDecision::Retry(delay_ms)
    }

    /// Next attempt timestamp for a given backoff delay
    pub fn next_attempt_at(&self, delay_ms: i64) -> i64 {
        self.time_provider.now_millis() + delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationKind;
    use crate::port::time_provider::mocks::MockTimeProvider;

    #[test]
    fn test_retry_until_max_attempts() {
        let time = Arc::new(MockTimeProvider::new(1_000_000));
        let policy = DispatchRetry::new(time, 1000);

        let mut notification = Notification::new_test("emp-1", NotificationKind::ExpiryWarning);
        notification.max_attempts = 3;

        // attempts=0: next send is attempt 1 of 3
        assert!(matches!(
            policy.should_retry(&notification),
            RetryDecision::Retry(_)
        ));

        notification.attempts = 1;
        assert!(matches!(
            policy.should_retry(&notification),
            RetryDecision::Retry(_)
        ));

        notification.attempts = 2;
        assert_eq!(policy.should_retry(&notification), RetryDecision::Failed);
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let time = Arc::new(MockTimeProvider::new(1_000_000));
        let policy = DispatchRetry::new(time, 1000);

        let mut notification = Notification::new_test("emp-1", NotificationKind::ExpiryWarning);
        notification.max_attempts = 10;
        notification.backoff_factor = 2.0;

        let first = match policy.should_retry(&notification) {
            RetryDecision::Retry(ms) => ms,
            _ => panic!("expected retry"),
        };

        notification.attempts = 3;
        let fourth = match policy.should_retry(&notification) {
            RetryDecision::Retry(ms) => ms,
            _ => panic!("expected retry"),
        };

        // 2^3 = 8x the base, jitter bounded by +/-10%
        assert!(fourth > first * 6);
    }

    #[test]
    fn test_jitter_is_deterministic_per_notification() {
        let time = Arc::new(MockTimeProvider::new(1_000_000));
        let policy = DispatchRetry::new(time, 1000);

        let mut notification = Notification::new_test("emp-1", NotificationKind::ExpiryWarning);
        notification.max_attempts = 5;

        let a = policy.should_retry(&notification);
        let b = policy.should_retry(&notification);
        assert_eq!(a, b);
    }
}
