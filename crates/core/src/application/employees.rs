//! Employee registration and lookup
//!
//! Registration creates the database record and bootstraps the container
//! directory tree plus its metadata sidecar in one pass.

use crate::domain::{ContainerMetadata, Employee, EmployeeId, FileCounts};
use crate::error::{AppError, Result};
use crate::port::{ContainerStore, EmployeeRepository, IdProvider, TimeProvider};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub staff_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub department_id: Option<String>,
}

pub struct EmployeeService {
    employee_repo: Arc<dyn EmployeeRepository>,
    container_store: Arc<dyn ContainerStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl EmployeeService {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        container_store: Arc<dyn ContainerStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            employee_repo,
            container_store,
            id_provider,
            time_provider,
        }
    }

    /// Register a new employee and bootstrap their container
    pub async fn register(&self, req: RegisterRequest) -> Result<Employee> {
        validate(&req)?;

        if let Some(existing) = self.employee_repo.find_by_email(&req.email).await? {
            return Err(AppError::Conflict(format!(
                "Email {} already registered to employee {}",
                req.email, existing.id
            )));
        }

        let now = self.time_provider.now_millis();
        let mut employee = Employee::new(
            self.id_provider.generate_id(),
            now,
            req.staff_number,
            req.full_name,
            req.email,
        );
        employee.department_id = req.department_id;

        self.employee_repo.insert(&employee).await?;

        // Container bootstrap: empty category dirs plus a fresh sidecar
        self.container_store.ensure_layout(&employee.id).await?;
        let metadata = ContainerMetadata::new(
            &employee.id,
            &employee.full_name,
            now,
            FileCounts::default(),
        );
        self.container_store
            .write_metadata(&employee.id, &metadata)
            .await?;
        self.employee_repo
            .touch_container_checked(&employee.id, now)
            .await?;

        info!(
            employee_id = %employee.id,
            staff_number = %employee.staff_number,
            "Employee registered"
        );

        Ok(employee)
    }

    /// Fetch an employee by ID
    pub async fn get(&self, employee_id: &EmployeeId) -> Result<Employee> {
        self.employee_repo
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {}", employee_id)))
    }
}

fn validate(req: &RegisterRequest) -> Result<()> {
    if req.staff_number.trim().is_empty() {
        return Err(AppError::Validation("staff_number is required".to_string()));
    }
    if req.full_name.trim().is_empty() {
        return Err(AppError::Validation("full_name is required".to_string()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::Validation(format!(
            "Invalid email: {:?}",
            req.email
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComplianceStatus, EmploymentStatus, METADATA_SCHEMA_VERSION};
    use crate::port::container_store::mocks::MockContainerStore;
    use crate::port::id_provider::mocks::MockIdProvider;
    use crate::port::time_provider::mocks::MockTimeProvider;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryEmployees {
        rows: Mutex<HashMap<String, Employee>>,
    }

    #[async_trait]
    impl EmployeeRepository for InMemoryEmployees {
        async fn insert(&self, employee: &Employee) -> Result<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(employee.id.clone(), employee.clone());
            Ok(())
        }

        async fn update(&self, employee: &Employee) -> Result<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(employee.id.clone(), employee.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>> {
            Ok(self.rows.lock().unwrap().get(id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|e| e.email == email)
                .cloned())
        }

        async fn list(&self, status: Option<EmploymentStatus>) -> Result<Vec<Employee>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|e| status.map(|s| e.status == s).unwrap_or(true))
                .cloned()
                .collect())
        }

        async fn update_compliance(
            &self,
            id: &EmployeeId,
            status: ComplianceStatus,
            now_millis: i64,
        ) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let employee = rows
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(id.clone()))?;
            employee.compliance_status = Some(status);
            employee.updated_at = Some(now_millis);
            Ok(())
        }

        async fn touch_container_checked(&self, id: &EmployeeId, now_millis: i64) -> Result<()> {
            if let Some(employee) = self.rows.lock().unwrap().get_mut(id) {
                employee.container_checked_at = Some(now_millis);
            }
            Ok(())
        }

        async fn count_by_status(&self, status: EmploymentStatus) -> Result<i64> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|e| e.status == status)
                .count() as i64)
        }
    }

    fn service() -> (Arc<InMemoryEmployees>, Arc<MockContainerStore>, EmployeeService) {
        let employees = Arc::new(InMemoryEmployees::default());
        let store = Arc::new(MockContainerStore::new());
        let service = EmployeeService::new(
            employees.clone(),
            store.clone(),
            Arc::new(MockIdProvider::new("emp")),
            Arc::new(MockTimeProvider::new(1_000)),
        );
        (employees, store, service)
    }

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            staff_number: "S9001".to_string(),
            full_name: "New Hire".to_string(),
            email: email.to_string(),
            department_id: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_row_and_container() {
        let (employees, store, service) = service();

        let employee = service.register(request("hire@example.test")).await.unwrap();

        assert!(employees
            .find_by_id(&employee.id)
            .await
            .unwrap()
            .is_some());
        assert!(store.root_exists(&employee.id).await.unwrap());

        let metadata = store.read_metadata(&employee.id).await.unwrap().unwrap();
        assert_eq!(metadata.schema_version, METADATA_SCHEMA_VERSION);
        assert_eq!(metadata.employee_name, "New Hire");
        assert_eq!(metadata.file_counts.total(), 0);

        let stored = employees.find_by_id(&employee.id).await.unwrap().unwrap();
        assert_eq!(stored.container_checked_at, Some(1_000));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let (_employees, _store, service) = service();

        service.register(request("dup@example.test")).await.unwrap();
        let err = service
            .register(request("dup@example.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (_employees, _store, service) = service();

        let mut bad = request("ok@example.test");
        bad.full_name = "  ".to_string();
        assert!(matches!(
            service.register(bad).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let bad = request("not-an-email");
        assert!(matches!(
            service.register(bad).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_employee_is_not_found() {
        let (_employees, _store, service) = service();
        let err = service.get(&"missing".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
