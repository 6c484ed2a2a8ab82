// Employee Domain Model

use crate::domain::compliance::ComplianceStatus;
use serde::{Deserialize, Serialize};

/// Employee ID (UUID v4)
pub type EmployeeId = String;

/// Employment state (plain enumeration, no side-effecting transitions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    Active,
    OnLeave,
    Terminated,
}

impl std::fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmploymentStatus::Active => write!(f, "ACTIVE"),
            EmploymentStatus::OnLeave => write!(f, "ON_LEAVE"),
            EmploymentStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

impl std::str::FromStr for EmploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(EmploymentStatus::Active),
            "ON_LEAVE" => Ok(EmploymentStatus::OnLeave),
            "TERMINATED" => Ok(EmploymentStatus::Terminated),
            other => Err(format!("Unknown employment status: {}", other)),
        }
    }
}

/// A completed background check, tracked as a JSON array field on the
/// employee record (distinct from training certificates)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundCheck {
    pub kind: String,
    pub completed_on: chrono::NaiveDate,
    pub reference: Option<String>,
}

/// Department lookup entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
}

/// Employee Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub staff_number: String,
    pub full_name: String,
    pub email: String,
    pub department_id: Option<String>,
    pub status: EmploymentStatus,

    /// Cached result of the last compliance audit
    pub compliance_status: Option<ComplianceStatus>,

    pub background_checks: Vec<BackgroundCheck>,

    /// Last successful container health check (epoch ms)
    pub container_checked_at: Option<i64>,

    pub created_at: i64, // epoch ms
    pub updated_at: Option<i64>,
}

impl Employee {
    /// Create a new ACTIVE employee
    ///
    /// # Arguments
    ///
    /// * `id` - Unique employee ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        staff_number: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            staff_number: staff_number.into(),
            full_name: full_name.into(),
            email: email.into(),
            department_id: None,
            status: EmploymentStatus::Active,
            compliance_status: None,
            background_checks: Vec::new(),
            container_checked_at: None,
            created_at,
            updated_at: None,
        }
    }

    /// Audits and notifications only apply to non-terminated staff
    pub fn is_auditable(&self) -> bool {
        self.status != EmploymentStatus::Terminated
    }
}

impl Employee {
    /// Create a test employee with deterministic ID and timestamp (tests only)
    pub fn new_test(full_name: impl Into<String>) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let name = full_name.into();
        Self::new(
            format!("emp-{}", counter),
            (counter * 1000) as i64,
            format!("S{:04}", counter),
            name.clone(),
            format!("user{}@example.test", counter),
        )
    }
}
