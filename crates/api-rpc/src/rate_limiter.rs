//! Rate Limiter (Token Bucket)
//!
//! Caps request rates on the mutating RPC methods. Lock-free: bucket
//! state lives in a single packed atomic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Token bucket limiter over a packed atomic
pub struct RateLimiter {
    state: Arc<BucketState>,
    max_tokens: u32,
    refill_rate: u32, // tokens per second
}

struct BucketState {
    // Upper 32 bits: available tokens
    // Lower 32 bits: last refill, ms since creation
    packed: AtomicU64,
    created: Instant,
}

impl RateLimiter {
    /// `max_tokens` is the burst size, `refill_rate` the sustained
    /// tokens-per-second rate
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            state: Arc::new(BucketState {
                packed: AtomicU64::new((max_tokens as u64) << 32),
                created: Instant::now(),
            }),
            max_tokens,
            refill_rate,
        }
    }

    /// Consume one token. Returns false when the bucket is empty.
    pub fn check(&self) -> bool {
        loop {
            let packed = self.state.packed.load(Ordering::Acquire);
            let tokens = (packed >> 32) as u32;
            let last_refill_ms = (packed & 0xFFFF_FFFF) as u32;

            let elapsed_ms = self.state.created.elapsed().as_millis() as u32;
            let delta_ms = elapsed_ms.saturating_sub(last_refill_ms);

            let refilled = (delta_ms as u64 * self.refill_rate as u64) / 1000;
            let available =
                ((tokens as u64 + refilled).min(self.max_tokens as u64)) as u32;

            if available >= 1 {
                let new_packed = (((available - 1) as u64) << 32) | (elapsed_ms as u64);
                match self.state.packed.compare_exchange(
                    packed,
                    new_packed,
                    Ordering::Release,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return true,
                    Err(_) => continue,
                }
            } else {
                // Empty; still advance the refill timestamp
                let new_packed = ((available as u64) << 32) | (elapsed_ms as u64);
                let _ = self.state.packed.compare_exchange(
                    packed,
                    new_packed,
                    Ordering::Release,
                    Ordering::Acquire,
                );
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_allows_burst_then_denies() {
        let limiter = RateLimiter::new(10, 10);

        for _ in 0..10 {
            assert!(limiter.check());
        }
        assert!(!limiter.check());
    }

    #[tokio::test]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::new(5, 10);

        for _ in 0..5 {
            assert!(limiter.check());
        }
        assert!(!limiter.check());

        sleep(Duration::from_secs(1)).await;
        assert!(limiter.check());
    }

    #[tokio::test]
    async fn test_concurrent_checks_respect_burst() {
        let limiter = Arc::new(RateLimiter::new(100, 50));

        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                let mut allowed = 0;
                for _ in 0..20 {
                    if limiter.check() {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert!(total <= 100, "expected at most 100 allowed, got {}", total);
        assert!(total >= 90, "expected at least 90 allowed, got {}", total);
    }
}
