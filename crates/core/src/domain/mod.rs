// Domain Layer - Pure business logic and entities

pub mod certificate;
pub mod compliance;
pub mod container;
pub mod employee;
pub mod error;
pub mod notification;
pub mod training;

// Re-exports
pub use certificate::{Certificate, CertificateId, CertificateStatus, Generation, VerificationCode};
pub use compliance::{ComplianceReport, ComplianceStatus, ComplianceSummary, ExpiringEntry};
pub use container::{
    ContainerCategory, ContainerHealthReport, ContainerIssue, ContainerMetadata, FileCounts,
    RepairOutcome, METADATA_FILE_NAME, METADATA_SCHEMA_VERSION,
};
pub use employee::{BackgroundCheck, Department, Employee, EmployeeId, EmploymentStatus};
pub use error::DomainError;
pub use notification::{
    DispatchState, Notification, NotificationId, NotificationKind, DEFAULT_MAX_ATTEMPTS,
};
pub use training::{TrainingType, TrainingTypeId};
