// Training Type Domain Model

use serde::{Deserialize, Serialize};

/// Training type ID (UUID v4)
pub type TrainingTypeId = String;

/// A category of training for which certificates are issued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingType {
    pub id: TrainingTypeId,
    pub name: String,
    /// Short unique code, e.g. "FIRE-SAFETY"
    pub code: String,

    /// Mandatory types drive compliance derivation
    pub mandatory: bool,

    /// Default certificate lifetime; used to compute an expiry date when a
    /// certificate is issued without one. None means never expires.
    pub validity_months: Option<u32>,

    /// Per-type override of the global expiry warning window
    pub warning_window_days: Option<i64>,

    pub created_at: i64, // epoch ms
}

impl TrainingType {
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        name: impl Into<String>,
        code: impl Into<String>,
        mandatory: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.into(),
            mandatory,
            validity_months: None,
            warning_window_days: None,
            created_at,
        }
    }
}

impl TrainingType {
    /// Create a test training type with deterministic ID (tests only)
    pub fn new_test(code: impl Into<String>, mandatory: bool) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let code = code.into();
        Self::new(
            format!("tt-{}", counter),
            (counter * 1000) as i64,
            code.clone(),
            code,
            mandatory,
        )
    }
}
