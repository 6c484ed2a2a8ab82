//! Container health - verifies the per-employee directory tree and the
//! metadata sidecar, and rebuilds both on repair.
//!
//! The database row and the directory contents are authoritative; the
//! sidecar is a cache. Repair never deletes files, it only creates
//! missing directories and rewrites the sidecar from observed state.

use crate::domain::{
    ContainerCategory, ContainerHealthReport, ContainerIssue, ContainerMetadata, Employee,
    FileCounts, RepairOutcome,
};
use crate::error::{AppError, Result};
use crate::port::{ContainerStore, EmployeeRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Counters from a whole-roster container sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub checked: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub repaired: usize,
    pub issues_found: usize,
}

/// Container health checker and repairer
pub struct HealthChecker {
    employee_repo: Arc<dyn EmployeeRepository>,
    container_store: Arc<dyn ContainerStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl HealthChecker {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        container_store: Arc<dyn ContainerStore>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            employee_repo,
            container_store,
            time_provider,
        }
    }

    /// Check one employee container without modifying anything
    pub async fn check(&self, employee_id: &str) -> Result<ContainerHealthReport> {
        let employee = self.load_employee(employee_id).await?;
        let checked_at = self.time_provider.now_millis();
        let mut issues = Vec::new();

        if !self.container_store.root_exists(employee_id).await? {
            // Nothing else to inspect without a root
            return Ok(ContainerHealthReport {
                employee_id: employee_id.to_string(),
                issues: vec![ContainerIssue::MissingRoot],
                checked_at,
            });
        }

        for category in ContainerCategory::ALL {
            if !self.container_store.category_exists(employee_id, category).await? {
                issues.push(ContainerIssue::MissingCategoryDir { category });
            }
        }

        match self.container_store.read_metadata(employee_id).await? {
            Some(metadata) => {
                self.check_metadata(&employee, &metadata, &mut issues).await?;
            }
            None => {
                // Distinguish absent from unparseable
                match self.container_store.read_metadata_raw(employee_id).await? {
                    None => issues.push(ContainerIssue::MissingMetadata),
                    Some(bytes) => {
                        let detail = match serde_json::from_slice::<ContainerMetadata>(&bytes) {
                            Err(e) => e.to_string(),
                            Ok(_) => "unreadable sidecar".to_string(),
                        };
                        issues.push(ContainerIssue::CorruptMetadata { detail });
                    }
                }
            }
        }

        Ok(ContainerHealthReport {
            employee_id: employee_id.to_string(),
            issues,
            checked_at,
        })
    }

    async fn check_metadata(
        &self,
        employee: &Employee,
        metadata: &ContainerMetadata,
        issues: &mut Vec<ContainerIssue>,
    ) -> Result<()> {
        if metadata.employee_name != employee.full_name {
            issues.push(ContainerIssue::NameMismatch {
                recorded: metadata.employee_name.clone(),
                expected: employee.full_name.clone(),
            });
        }

        for category in ContainerCategory::ALL {
            let actual = self.container_store.count_files(&employee.id, category).await?;
            let recorded = metadata.file_counts.get(category);
            if recorded != actual {
                issues.push(ContainerIssue::CountDrift {
                    category,
                    recorded,
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Repair one employee container: create missing directories, rebuild
    /// the sidecar from the directory contents and the DB record
    pub async fn repair(&self, employee_id: &str) -> Result<RepairOutcome> {
        let employee = self.load_employee(employee_id).await?;
        let now = self.time_provider.now_millis();

        let created_dirs = self.container_store.ensure_layout(employee_id).await?;

        // Preserve the original creation stamp when the old sidecar is
        // still readable
        let created_at = self
            .container_store
            .read_metadata(employee_id)
            .await?
            .map(|m| m.created_at)
            .unwrap_or(now);

        let mut file_counts = FileCounts::default();
        for category in ContainerCategory::ALL {
            let count = self.container_store.count_files(employee_id, category).await?;
            file_counts.set(category, count);
        }

        let mut metadata =
            ContainerMetadata::new(employee_id, employee.full_name.clone(), now, file_counts);
        metadata.created_at = created_at;

        self.container_store.write_metadata(employee_id, &metadata).await?;
        self.employee_repo
            .touch_container_checked(&employee.id, now)
            .await?;

        info!(
            employee_id = %employee_id,
            created_dirs = created_dirs.len(),
            "Container repaired"
        );

        Ok(RepairOutcome {
            employee_id: employee_id.to_string(),
            created_dirs,
            metadata_rebuilt: true,
            repaired_at: now,
        })
    }

    /// Sweep the whole roster: check every auditable employee and repair
    /// the unhealthy containers
    pub async fn sweep(&self, repair: bool) -> Result<SweepStats> {
        let employees = self.employee_repo.list(None).await?;
        let now = self.time_provider.now_millis();

        let mut stats = SweepStats::default();

        for employee in employees.iter().filter(|e| e.is_auditable()) {
            let report = self.check(&employee.id).await?;
            stats.checked += 1;

            if report.is_healthy() {
                stats.healthy += 1;
                self.employee_repo
                    .touch_container_checked(&employee.id, now)
                    .await?;
                continue;
            }

            stats.unhealthy += 1;
            stats.issues_found += report.issues.len();
            warn!(
                employee_id = %employee.id,
                issues = ?report.issues,
                "Unhealthy container"
            );

            if repair {
                self.repair(&employee.id).await?;
                stats.repaired += 1;
            }
        }

        info!(
            checked = stats.checked,
            healthy = stats.healthy,
            unhealthy = stats.unhealthy,
            repaired = stats.repaired,
            "Container sweep completed"
        );

        Ok(stats)
    }

    async fn load_employee(&self, employee_id: &str) -> Result<Employee> {
        self.employee_repo
            .find_by_id(&employee_id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {}", employee_id)))
    }
}
