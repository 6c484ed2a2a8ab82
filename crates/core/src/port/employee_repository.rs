// Employee Repository Port (Interface)

use crate::domain::{ComplianceStatus, Employee, EmployeeId, EmploymentStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Employee persistence
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Insert a new employee
    async fn insert(&self, employee: &Employee) -> Result<()>;

    /// Update an employee
    async fn update(&self, employee: &Employee) -> Result<()>;

    /// Find employee by ID
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>>;

    /// Find employee by email (unique)
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>>;

    /// List employees, optionally filtered by employment status
    async fn list(&self, status: Option<EmploymentStatus>) -> Result<Vec<Employee>>;

    /// Persist the cached compliance status after an audit
    async fn update_compliance(
        &self,
        id: &EmployeeId,
        status: ComplianceStatus,
        now_millis: i64,
    ) -> Result<()>;

    /// Stamp the last container health check time
    async fn touch_container_checked(&self, id: &EmployeeId, now_millis: i64) -> Result<()>;

    /// Count employees by employment status
    async fn count_by_status(&self, status: EmploymentStatus) -> Result<i64>;
}
