// Credent Infrastructure - SQLite Adapters
// Implements the repository ports, the transactional issue path and the
// Maintenance port over a single WAL-mode SQLite database.

mod certificate_repository;
mod connection;
mod employee_repository;
mod error_map;
mod maintenance_impl;
mod migration;
mod notification_repository;
mod training_type_repository;
mod transaction;

pub use certificate_repository::SqliteCertificateRepository;
pub use connection::create_pool;
pub use employee_repository::SqliteEmployeeRepository;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use notification_repository::SqliteNotificationRepository;
pub use training_type_repository::SqliteTrainingTypeRepository;
pub use transaction::SqliteCertificateTransaction;

// Note: sqlx::Error conversion is handled by the error_map helper
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
