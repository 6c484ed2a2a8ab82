// Notification Domain Model

use serde::{Deserialize, Serialize};

/// Notification ID (UUID v4)
pub type NotificationId = String;

/// Default delivery attempts before a notification is marked FAILED
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// What the notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ExpiryWarning,
    Expired,
    ComplianceAlert,
    TaskFailure,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::ExpiryWarning => write!(f, "EXPIRY_WARNING"),
            NotificationKind::Expired => write!(f, "EXPIRED"),
            NotificationKind::ComplianceAlert => write!(f, "COMPLIANCE_ALERT"),
            NotificationKind::TaskFailure => write!(f, "TASK_FAILURE"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "EXPIRY_WARNING" => Ok(NotificationKind::ExpiryWarning),
            "EXPIRED" => Ok(NotificationKind::Expired),
            "COMPLIANCE_ALERT" => Ok(NotificationKind::ComplianceAlert),
            "TASK_FAILURE" => Ok(NotificationKind::TaskFailure),
            other => Err(format!("Unknown notification kind: {}", other)),
        }
    }
}

/// Delivery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchState {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchState::Pending => write!(f, "PENDING"),
            DispatchState::Sent => write!(f, "SENT"),
            DispatchState::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for DispatchState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DispatchState::Pending),
            "SENT" => Ok(DispatchState::Sent),
            "FAILED" => Ok(DispatchState::Failed),
            other => Err(format!("Unknown dispatch state: {}", other)),
        }
    }
}

/// Notification Entity
///
/// Rows double as the delivery queue: PENDING rows with a due
/// next_attempt_at are picked up by the dispatcher, retried with backoff
/// and eventually marked SENT or FAILED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub employee_id: String,
    pub certificate_id: Option<String>,
    pub kind: NotificationKind,
    pub state: DispatchState,

    pub subject: String,
    pub body: String,

    // Retry bookkeeping
    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_factor: f64,
    pub next_attempt_at: Option<i64>, // epoch ms; None = due immediately

    pub created_at: i64, // epoch ms
    pub sent_at: Option<i64>,
    pub last_error: Option<String>,
}

impl Notification {
    /// Create a new PENDING notification due immediately
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        employee_id: impl Into<String>,
        kind: NotificationKind,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            employee_id: employee_id.into(),
            certificate_id: None,
            kind,
            state: DispatchState::Pending,
            subject: subject.into(),
            body: body.into(),
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: 2.0,
            next_attempt_at: None,
            created_at,
            sent_at: None,
            last_error: None,
        }
    }

    /// Mark as SENT with explicit timestamp
    pub fn mark_sent(&mut self, now_millis: i64) {
        self.state = DispatchState::Sent;
        self.sent_at = Some(now_millis);
        self.last_error = None;
    }

    /// Record a failed attempt and reschedule
    pub fn record_failure(&mut self, error: impl Into<String>, next_attempt_at: i64) {
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.next_attempt_at = Some(next_attempt_at);
    }

    /// Mark as permanently FAILED
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.state = DispatchState::Failed;
        self.last_error = Some(error.into());
        self.next_attempt_at = None;
    }
}

impl Notification {
    /// Create a test notification with deterministic ID and timestamp (tests only)
    pub fn new_test(employee_id: impl Into<String>, kind: NotificationKind) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("notif-{}", counter),
            (counter * 1000) as i64,
            employee_id,
            kind,
            format!("subject {}", counter),
            format!("body {}", counter),
        )
    }
}
