//! Credent Compliance Engine - Main Entry Point
//!
//! Composition root: wires the SQLite and filesystem adapters into the
//! application services, starts the JSON-RPC server and the schedule
//! runner, then waits for Ctrl+C.

mod telemetry;

use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use credent_api_rpc::handler::RpcDeps;
use credent_api_rpc::{RpcServer, RpcServerConfig};
use credent_core::application::schedule::constants;
use credent_core::application::status::DEFAULT_WARNING_WINDOW_DAYS;
use credent_core::application::{
    CertificateService, ComplianceAuditor, ComplianceService, DispatchRetry, EmployeeService,
    ExportService, HealthChecker, NotificationDispatcher, ScheduleConfig, ScheduleRunner,
    Shutdown, StatusPolicy, StatusReconciler,
};
use credent_core::port::id_provider::UuidProvider;
use credent_core::port::time_provider::SystemTimeProvider;
use credent_core::port::MaintenanceConfig;
use credent_infra_sqlite::{
    create_pool, run_migrations, SqliteCertificateRepository, SqliteEmployeeRepository,
    SqliteMaintenance, SqliteNotificationRepository, SqliteTrainingTypeRepository,
};
use credent_infra_storage::{FsContainerStore, OutboxMailSender, StorageProbeImpl};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.credent/credent.db";
const DEFAULT_DATA_DIR: &str = "~/.credent/data";
const DEFAULT_OUTBOX_DIR: &str = "~/.credent/outbox";
const DEFAULT_EXPORT_DIR: &str = "~/.credent/exports";
const DEFAULT_BACKUP_DIR: &str = "~/.credent/backups";

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .unwrap_or_else(|_| shellexpand::tilde(default).into_owned())
        .into()
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("CREDENT_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("credent=info"))
        .expect("Failed to create env filter");

    // Optional rolling file log next to the console output
    let _file_guard = match std::env::var("CREDENT_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "credentd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            match log_format.as_str() {
                "json" => tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                    .init(),
                _ => tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init(),
            }
            Some(guard)
        }
        Err(_) => {
            match log_format.as_str() {
                "json" => tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init(),
                _ => tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init(),
            }
            None
        }
    };

    info!("Credent Compliance Engine v{} starting...", VERSION);

    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let db_path = std::env::var("CREDENT_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());
    let data_dir = env_path("CREDENT_DATA_DIR", DEFAULT_DATA_DIR);
    let outbox_dir = env_path("CREDENT_OUTBOX_DIR", DEFAULT_OUTBOX_DIR);
    let export_dir = env_path("CREDENT_EXPORT_DIR", DEFAULT_EXPORT_DIR);
    let backup_dir = env_path("CREDENT_BACKUP_DIR", DEFAULT_BACKUP_DIR);

    let rpc_port: u16 = env_parse("CREDENT_RPC_PORT", 9620);
    let warning_window_days: i64 =
        env_parse("CREDENT_WARNING_WINDOW_DAYS", DEFAULT_WARNING_WINDOW_DAYS);
    let delivery_batch_size: i64 =
        env_parse("CREDENT_DELIVERY_BATCH_SIZE", constants::DEFAULT_DELIVERY_BATCH_SIZE);

    let schedule_config = ScheduleConfig {
        dispatch_interval_secs: env_parse(
            "CREDENT_DISPATCH_INTERVAL_SECS",
            constants::DEFAULT_DISPATCH_INTERVAL_SECS,
        ),
        audit_interval_secs: env_parse(
            "CREDENT_AUDIT_INTERVAL_SECS",
            constants::DEFAULT_AUDIT_INTERVAL_SECS,
        ),
        sweep_interval_secs: env_parse(
            "CREDENT_SWEEP_INTERVAL_SECS",
            constants::DEFAULT_SWEEP_INTERVAL_SECS,
        ),
        maintenance_interval_hours: env_parse(
            "CREDENT_MAINTENANCE_INTERVAL_HOURS",
            constants::DEFAULT_MAINTENANCE_INTERVAL_HOURS,
        ),
        sweep_auto_repair: env_parse("CREDENT_SWEEP_AUTO_REPAIR", true),
    };

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(db_path = %db_path, data_dir = %data_dir.display(), "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let status_policy = StatusPolicy::new(warning_window_days);

    let employee_repo = Arc::new(SqliteEmployeeRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));
    let certificate_repo = Arc::new(SqliteCertificateRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));
    let training_type_repo = Arc::new(SqliteTrainingTypeRepository::new(pool.clone()));
    let notification_repo = Arc::new(SqliteNotificationRepository::new(pool.clone()));

    let container_store = Arc::new(FsContainerStore::new(data_dir.clone()));
    let mail_sender = Arc::new(OutboxMailSender::new(outbox_dir));
    let storage_probe = Arc::new(StorageProbeImpl::new(data_dir));
    let maintenance = Arc::new(SqliteMaintenance::new(
        pool.clone(),
        backup_dir,
        time_provider.clone(),
    ));

    let employees = Arc::new(EmployeeService::new(
        employee_repo.clone(),
        container_store.clone(),
        id_provider.clone(),
        time_provider.clone(),
    ));
    let certificates = Arc::new(CertificateService::new(
        certificate_repo.clone(),
        certificate_repo.clone(),
        training_type_repo.clone(),
        id_provider.clone(),
        time_provider.clone(),
        status_policy.clone(),
    ));
    let compliance = Arc::new(ComplianceService::new(
        employee_repo.clone(),
        certificate_repo.clone(),
        training_type_repo.clone(),
        status_policy.clone(),
        time_provider.clone(),
    ));
    let health_checker = Arc::new(HealthChecker::new(
        employee_repo.clone(),
        container_store,
        time_provider.clone(),
    ));
    let exports = Arc::new(ExportService::new(
        employee_repo.clone(),
        certificate_repo.clone(),
        training_type_repo.clone(),
        time_provider.clone(),
        export_dir.clone(),
    ));
    credent_core::application::export::ensure_export_dir(&export_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Export dir setup failed: {}", e))?;

    let dispatcher = Arc::new(NotificationDispatcher::new(
        certificate_repo.clone(),
        employee_repo.clone(),
        training_type_repo.clone(),
        notification_repo.clone(),
        mail_sender,
        DispatchRetry::new(time_provider.clone(), constants::DEFAULT_RETRY_BASE_DELAY_MS),
        status_policy.clone(),
        id_provider.clone(),
        time_provider.clone(),
        delivery_batch_size,
    ));
    let auditor = Arc::new(ComplianceAuditor::new(
        employee_repo.clone(),
        notification_repo.clone(),
        compliance.clone(),
        id_provider.clone(),
        time_provider.clone(),
    ));

    // 5. Reconcile cached statuses against today's date (covers downtime)
    info!("Reconciling certificate statuses...");
    let reconciler = StatusReconciler::new(
        certificate_repo.clone(),
        training_type_repo.clone(),
        status_policy,
        time_provider.clone(),
    );
    match reconciler.reconcile().await {
        Ok(corrected) => info!(corrected = corrected, "Status reconciliation completed"),
        Err(e) => tracing::error!(error = ?e, "Status reconciliation failed"),
    }

    // 6. Schedule runner (periodic loops + manual trigger guards)
    let schedule = Arc::new(ScheduleRunner::new(
        dispatcher,
        auditor,
        health_checker.clone(),
        maintenance.clone(),
        MaintenanceConfig::default(),
        schedule_config,
    ));

    // 7. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(
        rpc_config,
        RpcDeps {
            employees,
            certificates,
            compliance,
            health_checker,
            exports,
            schedule: schedule.clone(),
            employee_repo,
            certificate_repo,
            notification_repo,
            maintenance,
            storage_probe,
        },
    );
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 8. Start scheduled loops
    let shutdown = Shutdown::new();
    let loop_handles = schedule.spawn_all(shutdown.token());

    info!("System ready. Press Ctrl+C to shutdown");

    // 9. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 10. Graceful shutdown
    shutdown.trigger();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    for handle in loop_handles {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete.");

    Ok(())
}
