//! Startup reconciliation and maintenance integration tests

use std::sync::Arc;

use chrono::NaiveDate;
use credent_core::application::{
    ComplianceAuditor, ComplianceService, DispatchRetry, HealthChecker, NotificationDispatcher,
    ScheduleConfig, ScheduleRunner, StatusPolicy, StatusReconciler,
};
use credent_core::domain::{
    Certificate, CertificateStatus, DispatchState, Employee, Notification, NotificationKind,
    TrainingType,
};
use credent_core::port::id_provider::mocks::MockIdProvider;
use credent_core::port::mail_sender::mocks::MockMailSender;
use credent_core::port::time_provider::mocks::MockTimeProvider;
use credent_core::port::{
    CertificateRepository, EmployeeRepository, Maintenance, MaintenanceConfig,
    NotificationRepository, TimeProvider, TrainingTypeRepository,
};
use credent_infra_sqlite::{
    create_pool, run_migrations, SqliteCertificateRepository, SqliteEmployeeRepository,
    SqliteMaintenance, SqliteNotificationRepository, SqliteTrainingTypeRepository,
};
use credent_infra_storage::FsContainerStore;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Stack {
    employee_repo: Arc<SqliteEmployeeRepository>,
    certificate_repo: Arc<SqliteCertificateRepository>,
    training_type_repo: Arc<SqliteTrainingTypeRepository>,
    notification_repo: Arc<SqliteNotificationRepository>,
    maintenance: Arc<SqliteMaintenance>,
    time: Arc<MockTimeProvider>,
    backup_dir: tempfile::TempDir,
}

impl Stack {
    async fn at(today: NaiveDate) -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time = Arc::new(MockTimeProvider::at_date(today));
        let backup_dir = tempfile::tempdir().unwrap();
        Self {
            employee_repo: Arc::new(SqliteEmployeeRepository::new(pool.clone(), time.clone())),
            certificate_repo: Arc::new(SqliteCertificateRepository::new(pool.clone(), time.clone())),
            training_type_repo: Arc::new(SqliteTrainingTypeRepository::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepository::new(pool.clone())),
            maintenance: Arc::new(SqliteMaintenance::new(
                pool,
                backup_dir.path().to_path_buf(),
                time.clone(),
            )),
            time,
            backup_dir,
        }
    }

    async fn seed_employee(&self) -> Employee {
        let employee = Employee::new_test("Maint Person");
        self.employee_repo.insert(&employee).await.unwrap();
        employee
    }

    async fn seed_training_type(&self, code: &str) -> TrainingType {
        let tt = TrainingType::new_test(code, true);
        self.training_type_repo.insert(&tt).await.unwrap();
        tt
    }

    async fn seed_certificate(
        &self,
        employee: &Employee,
        training_type: &TrainingType,
        expiry: Option<NaiveDate>,
    ) -> Certificate {
        let cert = Certificate::new_test(
            employee.id.clone(),
            training_type.id.clone(),
            1,
            date(2024, 1, 1),
            expiry,
        );
        self.certificate_repo.insert(&cert).await.unwrap();
        cert
    }

    fn reconciler(&self) -> StatusReconciler {
        StatusReconciler::new(
            self.certificate_repo.clone(),
            self.training_type_repo.clone(),
            StatusPolicy::new(30),
            self.time.clone(),
        )
    }
}

#[tokio::test]
async fn test_reconciler_corrects_drifted_statuses() {
    // The daemon was down while dates kept passing: rows still say ACTIVE
    let stack = Stack::at(date(2025, 7, 1)).await;
    let employee = stack.seed_employee().await;
    let tt = stack.seed_training_type("FIRST-AID").await;

    let lapsed = stack
        .seed_certificate(&employee, &tt, Some(date(2025, 6, 20)))
        .await;
    let closing = stack
        .seed_certificate(&employee, &tt, Some(date(2025, 7, 15)))
        .await;
    let fine = stack
        .seed_certificate(&employee, &tt, Some(date(2026, 7, 1)))
        .await;
    assert_eq!(lapsed.status, CertificateStatus::Active);

    let corrected = stack.reconciler().reconcile().await.unwrap();
    assert_eq!(corrected, 2);

    let fetch = |id: String| {
        let repo = stack.certificate_repo.clone();
        async move { repo.find_by_id(&id).await.unwrap().unwrap() }
    };
    assert_eq!(fetch(lapsed.id).await.status, CertificateStatus::Expired);
    assert_eq!(fetch(closing.id).await.status, CertificateStatus::ExpiringSoon);
    assert_eq!(fetch(fine.id).await.status, CertificateStatus::Active);

    // A second pass finds nothing left to fix
    assert_eq!(stack.reconciler().reconcile().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reconciler_leaves_terminal_rows_alone() {
    let stack = Stack::at(date(2025, 7, 1)).await;
    let employee = stack.seed_employee().await;
    let tt = stack.seed_training_type("WHMIS").await;

    let mut cert = Certificate::new_test(
        employee.id.clone(),
        tt.id.clone(),
        1,
        date(2024, 1, 1),
        Some(date(2025, 1, 1)), // long past expiry
    );
    cert.revoke(1_000).unwrap();
    stack.certificate_repo.insert(&cert).await.unwrap();

    assert_eq!(stack.reconciler().reconcile().await.unwrap(), 0);

    let stored = stack
        .certificate_repo
        .find_by_id(&cert.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, CertificateStatus::Revoked);
}

#[tokio::test]
async fn test_gc_respects_retention_and_state() {
    let stack = Stack::at(date(2025, 6, 1)).await;
    let employee = stack.seed_employee().await;
    let now = stack.time.now_millis();

    let seed = |suffix: &str, created_at: i64, sent: bool| {
        let mut n = Notification::new(
            format!("gc-{}", suffix),
            created_at,
            employee.id.clone(),
            NotificationKind::ExpiryWarning,
            "subject",
            "body",
        );
        if sent {
            n.mark_sent(created_at);
        }
        n
    };

    // Old+sent goes, recent+sent stays, old+pending stays
    let old_sent = seed("old-sent", now - 120 * DAY_MS, true);
    let recent_sent = seed("recent-sent", now - 10 * DAY_MS, true);
    let old_pending = seed("old-pending", now - 120 * DAY_MS, false);
    for n in [&old_sent, &recent_sent, &old_pending] {
        stack.notification_repo.insert(n).await.unwrap();
    }

    let deleted = stack.maintenance.gc_notifications(90).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(stack
        .notification_repo
        .find_by_id(&old_sent.id)
        .await
        .unwrap()
        .is_none());
    assert!(stack
        .notification_repo
        .find_by_id(&recent_sent.id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        stack
            .notification_repo
            .count_by_state(DispatchState::Pending)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_snapshot_written_and_stats_reported() {
    let stack = Stack::at(date(2025, 6, 1)).await;
    let employee = stack.seed_employee().await;
    let tt = stack.seed_training_type("FORKLIFT").await;
    stack
        .seed_certificate(&employee, &tt, Some(date(2026, 6, 1)))
        .await;

    let path = stack.maintenance.snapshot_db(14).await.unwrap();
    assert!(std::path::Path::new(&path).is_file());
    assert!(path.contains("snapshot_"));
    assert!(path.starts_with(stack.backup_dir.path().to_str().unwrap()));

    let stats = stack.maintenance.get_stats().await.unwrap();
    assert_eq!(stats.employee_count, 1);
    assert_eq!(stats.certificate_count, 1);
    assert!(stats.db_size_bytes > 0);
}

#[tokio::test]
async fn test_schedule_runner_manual_triggers() {
    let stack = Stack::at(date(2025, 6, 1)).await;
    let employee = stack.seed_employee().await;
    let tt = stack.seed_training_type("FIRE-SAFETY").await;
    stack
        .seed_certificate(&employee, &tt, Some(date(2025, 6, 15)))
        .await;

    let data_dir = tempfile::tempdir().unwrap();
    let container_store = Arc::new(FsContainerStore::new(data_dir.path().to_path_buf()));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        stack.certificate_repo.clone(),
        stack.employee_repo.clone(),
        stack.training_type_repo.clone(),
        stack.notification_repo.clone(),
        Arc::new(MockMailSender::new_success()),
        DispatchRetry::new(stack.time.clone(), 60_000),
        StatusPolicy::new(30),
        Arc::new(MockIdProvider::new("n")),
        stack.time.clone(),
        100,
    ));
    let compliance = Arc::new(ComplianceService::new(
        stack.employee_repo.clone(),
        stack.certificate_repo.clone(),
        stack.training_type_repo.clone(),
        StatusPolicy::new(30),
        stack.time.clone(),
    ));
    let auditor = Arc::new(ComplianceAuditor::new(
        stack.employee_repo.clone(),
        stack.notification_repo.clone(),
        compliance,
        Arc::new(MockIdProvider::new("a")),
        stack.time.clone(),
    ));
    let health_checker = Arc::new(HealthChecker::new(
        stack.employee_repo.clone(),
        container_store,
        stack.time.clone(),
    ));

    let runner = Arc::new(ScheduleRunner::new(
        dispatcher,
        auditor,
        health_checker,
        stack.maintenance.clone(),
        MaintenanceConfig::default(),
        ScheduleConfig::default(),
    ));

    // Certificate inside the warning window: one warning, delivered
    let dispatch = runner.run_dispatch().await.unwrap();
    assert_eq!(dispatch.warnings_created, 1);
    assert_eq!(dispatch.delivered, 1);

    // The roster is covered (ExpiringSoon still counts), so AT_RISK
    let audit = runner.run_audit().await.unwrap();
    assert_eq!(audit.evaluated, 1);
    assert_eq!(audit.at_risk, 1);

    // Sweep repairs the never-bootstrapped container
    let sweep = runner.run_sweep().await.unwrap();
    assert_eq!(sweep.checked, 1);
    assert_eq!(sweep.repaired, 1);

    // Full maintenance returns fresh stats and leaves a snapshot behind
    let stats = runner.run_maintenance().await.unwrap();
    assert_eq!(stats.employee_count, 1);
    let snapshots = std::fs::read_dir(stack.backup_dir.path())
        .unwrap()
        .count();
    assert_eq!(snapshots, 1);
}
