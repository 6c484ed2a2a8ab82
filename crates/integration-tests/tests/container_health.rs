//! Container health integration tests
//!
//! Registration bootstraps the on-disk container; these tests damage it
//! in various ways and verify check, repair and the roster sweep.

use std::sync::Arc;

use credent_core::application::{EmployeeService, HealthChecker, RegisterRequest};
use credent_core::domain::{
    ContainerCategory, ContainerIssue, Employee, METADATA_FILE_NAME,
};
use credent_core::port::id_provider::UuidProvider;
use credent_core::port::time_provider::SystemTimeProvider;
use credent_core::port::{ContainerStore, EmployeeRepository};
use credent_infra_sqlite::{create_pool, run_migrations, SqliteEmployeeRepository};
use credent_infra_storage::FsContainerStore;
use std::path::PathBuf;

struct Stack {
    employee_repo: Arc<SqliteEmployeeRepository>,
    container_store: Arc<FsContainerStore>,
    employees: EmployeeService,
    health: HealthChecker,
    data_dir: tempfile::TempDir,
}

impl Stack {
    async fn new() -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time = Arc::new(SystemTimeProvider);
        let employee_repo = Arc::new(SqliteEmployeeRepository::new(pool, time.clone()));

        let data_dir = tempfile::tempdir().unwrap();
        let container_store = Arc::new(FsContainerStore::new(data_dir.path().to_path_buf()));

        let employees = EmployeeService::new(
            employee_repo.clone(),
            container_store.clone(),
            Arc::new(UuidProvider),
            time.clone(),
        );
        let health = HealthChecker::new(employee_repo.clone(), container_store.clone(), time);

        Self {
            employee_repo,
            container_store,
            employees,
            health,
            data_dir,
        }
    }

    async fn register(&self, staff_number: &str, email: &str) -> Employee {
        self.employees
            .register(RegisterRequest {
                staff_number: staff_number.to_string(),
                full_name: "Container Person".to_string(),
                email: email.to_string(),
                department_id: None,
            })
            .await
            .unwrap()
    }

    fn container_root(&self, employee_id: &str) -> PathBuf {
        self.data_dir.path().join("employees").join(employee_id)
    }
}

#[tokio::test]
async fn test_fresh_registration_is_healthy() {
    let stack = Stack::new().await;
    let employee = stack.register("EMP-100", "fresh@example.com").await;

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report.is_healthy(), "issues: {:?}", report.issues);
}

#[tokio::test]
async fn test_missing_category_dir_detected_and_repaired() {
    let stack = Stack::new().await;
    let employee = stack.register("EMP-101", "missing-dir@example.com").await;

    let photos = stack.container_root(&employee.id).join("photos");
    std::fs::remove_dir_all(&photos).unwrap();

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report.issues.contains(&ContainerIssue::MissingCategoryDir {
        category: ContainerCategory::Photos
    }));

    let outcome = stack.health.repair(&employee.id).await.unwrap();
    assert_eq!(outcome.created_dirs.len(), 1);
    assert!(outcome.metadata_rebuilt);

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report.is_healthy());
}

#[tokio::test]
async fn test_corrupt_sidecar_detected_and_rebuilt() {
    let stack = Stack::new().await;
    let employee = stack.register("EMP-102", "corrupt@example.com").await;

    let sidecar = stack.container_root(&employee.id).join(METADATA_FILE_NAME);
    std::fs::write(&sidecar, b"{ not json at all").unwrap();

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report
        .issues
        .iter()
        .any(|i| matches!(i, ContainerIssue::CorruptMetadata { .. })));

    stack.health.repair(&employee.id).await.unwrap();

    let metadata = stack
        .container_store
        .read_metadata(&employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metadata.employee_id, employee.id);
    assert_eq!(metadata.employee_name, "Container Person");
}

#[tokio::test]
async fn test_count_drift_detected_and_recounted() {
    let stack = Stack::new().await;
    let employee = stack.register("EMP-103", "drift@example.com").await;

    // A file added behind the sidecar's back
    stack
        .container_store
        .put_file(
            &employee.id,
            ContainerCategory::Certificates,
            "first-aid.pdf",
            b"pdf",
        )
        .await
        .unwrap();

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report.issues.contains(&ContainerIssue::CountDrift {
        category: ContainerCategory::Certificates,
        recorded: 0,
        actual: 1,
    }));

    stack.health.repair(&employee.id).await.unwrap();

    let metadata = stack
        .container_store
        .read_metadata(&employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metadata.file_counts.certificates, 1);

    let report = stack.health.check(&employee.id).await.unwrap();
    assert!(report.is_healthy());
}

#[tokio::test]
async fn test_missing_root_reported_without_other_noise() {
    let stack = Stack::new().await;
    let employee = stack.register("EMP-104", "gone@example.com").await;

    std::fs::remove_dir_all(stack.container_root(&employee.id)).unwrap();

    let report = stack.health.check(&employee.id).await.unwrap();
    assert_eq!(report.issues, vec![ContainerIssue::MissingRoot]);
}

#[tokio::test]
async fn test_sweep_repairs_unhealthy_containers() {
    let stack = Stack::new().await;
    let healthy = stack.register("EMP-105", "ok@example.com").await;
    let broken = stack.register("EMP-106", "broken@example.com").await;

    std::fs::remove_dir_all(stack.container_root(&broken.id).join("documents")).unwrap();

    let stats = stack.health.sweep(true).await.unwrap();
    assert_eq!(stats.checked, 2);
    assert_eq!(stats.healthy, 1);
    assert_eq!(stats.unhealthy, 1);
    assert_eq!(stats.repaired, 1);

    let report = stack.health.check(&broken.id).await.unwrap();
    assert!(report.is_healthy());

    // Both rows carry a fresh check stamp afterwards
    for id in [&healthy.id, &broken.id] {
        let row = stack.employee_repo.find_by_id(id).await.unwrap().unwrap();
        assert!(row.container_checked_at.is_some());
    }
}
