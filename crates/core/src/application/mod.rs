// Application Layer - Use Cases and Business Logic

pub mod audit;
pub mod certificates;
pub mod compliance;
pub mod container_health;
pub mod dispatch;
pub mod employees;
pub mod export;
pub mod reconcile;
pub mod retry;
pub mod schedule;
pub mod status;

// Re-exports
pub use audit::{AuditStats, ComplianceAuditor};
pub use certificates::CertificateService;
pub use compliance::ComplianceService;
pub use container_health::{HealthChecker, SweepStats};
pub use dispatch::{DispatchStats, NotificationDispatcher};
pub use employees::{EmployeeService, RegisterRequest};
pub use export::{ExportDataset, ExportFormat, ExportOutcome, ExportService};
pub use reconcile::StatusReconciler;
pub use retry::{DispatchRetry, RetryDecision};
pub use schedule::{OverlapGuard, ScheduleConfig, ScheduleRunner, Shutdown, ShutdownToken};
pub use status::StatusPolicy;
