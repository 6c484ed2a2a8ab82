// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique entity ID
    fn generate_id(&self) -> String;

    /// Generate a certificate verification code
    fn generate_verification_code(&self) -> String {
        // Short, human-checkable form of a fresh ID
        let id = self.generate_id();
        let compact: String = id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        format!("VC-{}", &compact[..compact.len().min(10)].to_uppercase())
    }
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Sequential ID provider for deterministic tests
    pub struct MockIdProvider {
        counter: AtomicU64,
        prefix: String,
    }

    impl MockIdProvider {
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                counter: AtomicU64::new(1),
                prefix: prefix.into(),
            }
        }
    }

    impl IdProvider for MockIdProvider {
        fn generate_id(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            format!("{}-{}", self.prefix, n)
        }
    }
}
