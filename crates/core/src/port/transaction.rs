// Transaction port for atomic operations

use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional certificate operations (the issue/supersede path)
#[async_trait]
pub trait TransactionalCertificateRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn CertificateTransaction>>;
}

/// Certificate operations within a transaction
#[async_trait]
pub trait CertificateTransaction: Transaction {
    /// Reserve the next generation for a series (within transaction)
    async fn next_generation(&mut self, employee_id: &str, training_type_id: &str) -> Result<i64>;

    /// Insert certificate (within transaction)
    async fn insert(&mut self, certificate: &crate::domain::Certificate) -> Result<()>;

    /// Mark older non-terminal certificates of the series as SUPERSEDED
    /// (within transaction). Returns the number of rows superseded.
    async fn supersede_older(
        &mut self,
        employee_id: &str,
        training_type_id: &str,
        below_generation: i64,
    ) -> Result<u64>;
}
