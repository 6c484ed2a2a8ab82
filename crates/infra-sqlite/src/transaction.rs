// SQLite transaction for the certificate issue path

use crate::error_map::map_sqlx_error;
use async_trait::async_trait;
use credent_core::domain::Certificate;
use credent_core::error::Result;
use credent_core::port::{CertificateTransaction, TimeProvider, Transaction};
use sqlx::Sqlite;
use std::sync::Arc;

/// Holds an open SQLite transaction; every operation runs inside it so the
/// generation bump, insert and supersede land atomically.
pub struct SqliteCertificateTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCertificateTransaction {
    pub(crate) fn new(
        tx: sqlx::Transaction<'static, Sqlite>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { tx, time_provider }
    }
}

#[async_trait]
impl Transaction for SqliteCertificateTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl CertificateTransaction for SqliteCertificateTransaction {
    async fn next_generation(&mut self, employee_id: &str, training_type_id: &str) -> Result<i64> {
        let latest: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT latest_generation FROM certificate_series
            WHERE employee_id = ? AND training_type_id = ?
            "#,
        )
        .bind(employee_id)
        .bind(training_type_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        let next = match latest {
            Some(latest) => {
                let next = latest + 1;
                sqlx::query(
                    r#"
                    UPDATE certificate_series SET latest_generation = ?
                    WHERE employee_id = ? AND training_type_id = ?
                    "#,
                )
                .bind(next)
                .bind(employee_id)
                .bind(training_type_id)
                .execute(&mut *self.tx)
                .await
                .map_err(map_sqlx_error)?;
                next
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO certificate_series (employee_id, training_type_id, latest_generation)
                    VALUES (?, ?, 1)
                    "#,
                )
                .bind(employee_id)
                .bind(training_type_id)
                .execute(&mut *self.tx)
                .await
                .map_err(map_sqlx_error)?;
                1
            }
        };

        Ok(next)
    }

    async fn insert(&mut self, certificate: &Certificate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO certificates (
                id, employee_id, training_type_id, generation,
                provider, verification_code, issue_date, expiry_date,
                status, created_at, status_updated_at, revoked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&certificate.id)
        .bind(&certificate.employee_id)
        .bind(&certificate.training_type_id)
        .bind(certificate.generation)
        .bind(&certificate.provider)
        .bind(certificate.verification_code.as_str())
        .bind(certificate.issue_date)
        .bind(certificate.expiry_date)
        .bind(certificate.status.to_string())
        .bind(certificate.created_at)
        .bind(certificate.status_updated_at)
        .bind(certificate.revoked_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn supersede_older(
        &mut self,
        employee_id: &str,
        training_type_id: &str,
        below_generation: i64,
    ) -> Result<u64> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            UPDATE certificates
            SET status = 'SUPERSEDED', status_updated_at = ?
            WHERE employee_id = ? AND training_type_id = ?
              AND generation < ?
              AND status NOT IN ('SUPERSEDED', 'REVOKED')
            "#,
        )
        .bind(now)
        .bind(employee_id)
        .bind(training_type_id)
        .bind(below_generation)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
