// Port Layer - Interfaces for external dependencies

pub mod certificate_repository;
pub mod container_store;
pub mod employee_repository;
pub mod id_provider; // For deterministic testing
pub mod mail_sender;
pub mod maintenance;
pub mod notification_repository;
pub mod storage_probe;
pub mod time_provider;
pub mod training_type_repository;
pub mod transaction;

// Re-exports
pub use certificate_repository::CertificateRepository;
pub use container_store::ContainerStore;
pub use employee_repository::EmployeeRepository;
pub use id_provider::IdProvider;
pub use mail_sender::{MailMessage, MailSender, SendError};
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats};
pub use notification_repository::NotificationRepository;
pub use storage_probe::{StorageMetrics, StorageProbe};
pub use time_provider::TimeProvider;
pub use training_type_repository::TrainingTypeRepository;
pub use transaction::{CertificateTransaction, Transaction, TransactionalCertificateRepository};
