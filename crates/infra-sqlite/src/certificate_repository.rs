// SQLite CertificateRepository Implementation

use crate::error_map::map_sqlx_error;
use crate::SqliteCertificateTransaction;
use async_trait::async_trait;
use chrono::NaiveDate;
use credent_core::domain::{Certificate, CertificateId, CertificateStatus, EmployeeId, VerificationCode};
use credent_core::error::{AppError, Result};
use credent_core::port::{
    CertificateRepository, CertificateTransaction, TimeProvider, TransactionalCertificateRepository,
};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

const TERMINAL_STATES: &str = "('SUPERSEDED', 'REVOKED')";

pub struct SqliteCertificateRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCertificateRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl CertificateRepository for SqliteCertificateRepository {
    async fn insert(&self, certificate: &Certificate) -> Result<()> {
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
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, certificate: &Certificate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE certificates
            SET provider = ?, issue_date = ?, expiry_date = ?,
                status = ?, status_updated_at = ?, revoked_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&certificate.provider)
        .bind(certificate.issue_date)
        .bind(certificate.expiry_date)
        .bind(certificate.status.to_string())
        .bind(certificate.status_updated_at)
        .bind(certificate.revoked_at)
        .bind(&certificate.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>("SELECT * FROM certificates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_certificate()))
    }

    async fn find_current_for(&self, employee_id: &EmployeeId) -> Result<Vec<Certificate>> {
        // Latest generation per (employee, training type) series, terminal
        // rows excluded
        let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
            r#"
            SELECT * FROM certificates c
            WHERE c.employee_id = ?
              AND c.status NOT IN {TERMINAL_STATES}
              AND c.generation = (
                  SELECT MAX(generation)
                  FROM certificates
                  WHERE employee_id = c.employee_id
                    AND training_type_id = c.training_type_id
              )
            ORDER BY c.training_type_id ASC
            "#
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_certificate()).collect())
    }

    async fn find_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Certificate>> {
        let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
            r#"
            SELECT * FROM certificates
            WHERE expiry_date IS NOT NULL
              AND expiry_date >= ? AND expiry_date <= ?
              AND status NOT IN {TERMINAL_STATES}
            ORDER BY expiry_date ASC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_certificate()).collect())
    }

    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Certificate>> {
        let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
            r#"
            SELECT * FROM certificates
            WHERE expiry_date IS NOT NULL
              AND expiry_date < ?
              AND status NOT IN {TERMINAL_STATES}
            ORDER BY expiry_date ASC
            "#
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_certificate()).collect())
    }

    async fn find_non_terminal(&self) -> Result<Vec<Certificate>> {
        let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
            "SELECT * FROM certificates WHERE status NOT IN {TERMINAL_STATES} ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_certificate()).collect())
    }

    async fn update_status(
        &self,
        id: &CertificateId,
        status: CertificateStatus,
        now_millis: i64,
    ) -> Result<()> {
        // Conditional update: terminal rows are never rewritten
        let result = sqlx::query(&format!(
            r#"
            UPDATE certificates
            SET status = ?, status_updated_at = ?
            WHERE id = ? AND status NOT IN {TERMINAL_STATES}
            "#
        ))
        .bind(status.to_string())
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT status FROM certificates WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

            match exists {
                None => Err(AppError::NotFound(format!("Certificate {} not found", id))),
                Some(current) => Err(AppError::InvalidState(format!(
                    "Cannot update certificate {} from {} to {}",
                    id, current, status
                ))),
            }
        } else {
            Ok(())
        }
    }

    async fn count_by_status(&self, status: CertificateStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn list_all(&self) -> Result<Vec<Certificate>> {
        let rows: Vec<CertificateRow> =
            sqlx::query_as("SELECT * FROM certificates ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_certificate()).collect())
    }
}

#[async_trait]
impl TransactionalCertificateRepository for SqliteCertificateRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn CertificateTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteCertificateTransaction::new(
            tx,
            Arc::clone(&self.time_provider),
        )))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CertificateRow {
    id: String,
    employee_id: String,
    training_type_id: String,
    generation: i64,
    provider: Option<String>,
    verification_code: String,
    issue_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    status: String,
    created_at: i64,
    status_updated_at: Option<i64>,
    revoked_at: Option<i64>,
}

impl CertificateRow {
    pub(crate) fn into_certificate(self) -> Certificate {
        let status =
            CertificateStatus::from_str(&self.status).unwrap_or(CertificateStatus::Expired);

        Certificate {
            id: self.id,
            employee_id: self.employee_id,
            training_type_id: self.training_type_id,
            generation: self.generation,
            provider: self.provider,
            verification_code: VerificationCode::new(self.verification_code),
            issue_date: self.issue_date,
            expiry_date: self.expiry_date,
            status,
            created_at: self.created_at,
            status_updated_at: self.status_updated_at,
            revoked_at: self.revoked_at,
        }
    }
}
