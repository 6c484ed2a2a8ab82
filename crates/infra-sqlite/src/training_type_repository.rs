// SQLite TrainingTypeRepository Implementation

use crate::error_map::map_sqlx_error;
use async_trait::async_trait;
use credent_core::domain::{TrainingType, TrainingTypeId};
use credent_core::error::Result;
use credent_core::port::TrainingTypeRepository;
use sqlx::SqlitePool;

pub struct SqliteTrainingTypeRepository {
    pool: SqlitePool,
}

impl SqliteTrainingTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainingTypeRepository for SqliteTrainingTypeRepository {
    async fn insert(&self, training_type: &TrainingType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO training_types (
                id, name, code, mandatory, validity_months,
                warning_window_days, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&training_type.id)
        .bind(&training_type.name)
        .bind(&training_type.code)
        .bind(if training_type.mandatory { 1 } else { 0 })
        .bind(training_type.validity_months)
        .bind(training_type.warning_window_days)
        .bind(training_type.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TrainingTypeId) -> Result<Option<TrainingType>> {
        let row = sqlx::query_as::<_, TrainingTypeRow>("SELECT * FROM training_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_training_type()))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<TrainingType>> {
        let row =
            sqlx::query_as::<_, TrainingTypeRow>("SELECT * FROM training_types WHERE code = ?")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_training_type()))
    }

    async fn list(&self) -> Result<Vec<TrainingType>> {
        let rows: Vec<TrainingTypeRow> =
            sqlx::query_as("SELECT * FROM training_types ORDER BY code ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_training_type()).collect())
    }

    async fn list_mandatory(&self) -> Result<Vec<TrainingType>> {
        let rows: Vec<TrainingTypeRow> =
            sqlx::query_as("SELECT * FROM training_types WHERE mandatory = 1 ORDER BY code ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_training_type()).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrainingTypeRow {
    id: String,
    name: String,
    code: String,
    mandatory: i32,
    validity_months: Option<u32>,
    warning_window_days: Option<i64>,
    created_at: i64,
}

impl TrainingTypeRow {
    fn into_training_type(self) -> TrainingType {
        TrainingType {
            id: self.id,
            name: self.name,
            code: self.code,
            mandatory: self.mandatory != 0,
            validity_months: self.validity_months,
            warning_window_days: self.warning_window_days,
            created_at: self.created_at,
        }
    }
}
