// Overlap guard for scheduled tasks
//
// A slow pass must not stack with the next tick of the same task; the
// tick is skipped instead.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Single-flight lock for one named scheduled task
pub struct OverlapGuard {
    name: &'static str,
    running: AtomicBool,
}

impl OverlapGuard {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquire the task slot. None if a previous run is still active;
    /// the caller should skip this tick.
    pub fn try_acquire(&self) -> Option<OverlapPermit<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(OverlapPermit { guard: self })
        } else {
            warn!(task = %self.name, "Previous run still active, skipping tick");
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the slot on drop
pub struct OverlapPermit<'a> {
    guard: &'a OverlapGuard,
}

impl Drop for OverlapPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = OverlapGuard::new("dispatch");

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_permit_releases_on_panic_unwind() {
        let guard = OverlapGuard::new("audit");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("task blew up");
        }));
        assert!(result.is_err());
        assert!(!guard.is_running());
    }
}
