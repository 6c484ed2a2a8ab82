// Migration Runner
//
// Migrations are ordered .sql files compiled into the binary. Each file
// records its own version row in schema_version, so the runner only has
// to skip anything at or below the current version.

use credent_core::error::{AppError, Result};
use sqlx::SqlitePool;
use tracing::info;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "initial schema",
        include_str!("../migrations/001_initial_schema.sql"),
    ),
    (
        2,
        "notifications",
        include_str!("../migrations/002_notifications.sql"),
    ),
    (
        3,
        "compliance cache",
        include_str!("../migrations/003_compliance_cache.sql"),
    ),
];

/// Bring the schema up to the latest version
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = current_version(pool).await?;
    info!(version = current, "Checking schema version");

    for (version, name, sql) in MIGRATIONS {
        if *version > current {
            info!(version = version, name = name, "Applying migration");
            apply_migration(pool, sql).await?;
        }
    }

    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(version.unwrap_or(0))
}

/// Run one migration file inside a transaction.
///
/// sqlx executes a single statement per query, so the file is split on
/// semicolons with comment lines stripped first.
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    for statement in sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
