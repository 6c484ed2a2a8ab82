// SQLite EmployeeRepository Implementation

use crate::error_map::map_sqlx_error;
use async_trait::async_trait;
use credent_core::domain::{ComplianceStatus, Employee, EmployeeId, EmploymentStatus};
use credent_core::error::{AppError, Result};
use credent_core::port::{EmployeeRepository, TimeProvider};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteEmployeeRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteEmployeeRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl EmployeeRepository for SqliteEmployeeRepository {
    async fn insert(&self, employee: &Employee) -> Result<()> {
        let background_checks = serde_json::to_string(&employee.background_checks)?;

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, staff_number, full_name, email, department_id,
                status, background_checks, container_checked_at,
                compliance_status, compliance_updated_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.staff_number)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.department_id)
        .bind(employee.status.to_string())
        .bind(&background_checks)
        .bind(employee.container_checked_at)
        .bind(employee.compliance_status.map(|s| s.to_string()))
        .bind(None::<i64>)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, employee: &Employee) -> Result<()> {
        let background_checks = serde_json::to_string(&employee.background_checks)?;
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            UPDATE employees
            SET staff_number = ?, full_name = ?, email = ?, department_id = ?,
                status = ?, background_checks = ?, container_checked_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.staff_number)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.department_id)
        .bind(employee.status.to_string())
        .bind(&background_checks)
        .bind(employee.container_checked_at)
        .bind(now)
        .bind(&employee.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_employee()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_employee()))
    }

    async fn list(&self, status: Option<EmploymentStatus>) -> Result<Vec<Employee>> {
        let rows: Vec<EmployeeRow> = match status {
            Some(status) => {
                sqlx::query_as("SELECT * FROM employees WHERE status = ? ORDER BY staff_number ASC")
                    .bind(status.to_string())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
            }
            None => sqlx::query_as("SELECT * FROM employees ORDER BY staff_number ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?,
        };

        Ok(rows.into_iter().map(|r| r.into_employee()).collect())
    }

    async fn update_compliance(
        &self,
        id: &EmployeeId,
        status: ComplianceStatus,
        now_millis: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET compliance_status = ?, compliance_updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Employee {} not found", id)));
        }
        Ok(())
    }

    async fn touch_container_checked(&self, id: &EmployeeId, now_millis: i64) -> Result<()> {
        sqlx::query("UPDATE employees SET container_checked_at = ? WHERE id = ?")
            .bind(now_millis)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn count_by_status(&self, status: EmploymentStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: String,
    staff_number: String,
    full_name: String,
    email: String,
    department_id: Option<String>,
    status: String,
    background_checks: String,
    container_checked_at: Option<i64>,
    compliance_status: Option<String>,
    #[allow(dead_code)]
    compliance_updated_at: Option<i64>,
    created_at: i64,
    updated_at: Option<i64>,
}

impl EmployeeRow {
    fn into_employee(self) -> Employee {
        let status = EmploymentStatus::from_str(&self.status).unwrap_or(EmploymentStatus::Active);
        let compliance_status = self
            .compliance_status
            .as_deref()
            .and_then(|s| ComplianceStatus::from_str(s).ok());
        let background_checks =
            serde_json::from_str(&self.background_checks).unwrap_or_default();

        Employee {
            id: self.id,
            staff_number: self.staff_number,
            full_name: self.full_name,
            email: self.email,
            department_id: self.department_id,
            status,
            compliance_status,
            background_checks,
            container_checked_at: self.container_checked_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
