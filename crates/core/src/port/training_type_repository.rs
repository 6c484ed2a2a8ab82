// Training Type Repository Port (Interface)

use crate::domain::{TrainingType, TrainingTypeId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for TrainingType persistence
#[async_trait]
pub trait TrainingTypeRepository: Send + Sync {
    /// Insert a new training type
    async fn insert(&self, training_type: &TrainingType) -> Result<()>;

    /// Find by ID
    async fn find_by_id(&self, id: &TrainingTypeId) -> Result<Option<TrainingType>>;

    /// Find by unique code
    async fn find_by_code(&self, code: &str) -> Result<Option<TrainingType>>;

    /// List all training types
    async fn list(&self) -> Result<Vec<TrainingType>>;

    /// List mandatory training types (compliance derivation)
    async fn list_mandatory(&self) -> Result<Vec<TrainingType>>;
}
