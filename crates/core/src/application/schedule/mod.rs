//! Schedule runner - periodic loops for dispatch, compliance audit,
//! container sweep and DB maintenance.
//!
//! Every task is overlap-guarded: a tick that fires while the previous
//! run is still going is skipped, never stacked. The same guards cover
//! manual triggers from the RPC API.

pub mod constants;
pub mod overlap;
pub mod shutdown;

pub use overlap::OverlapGuard;
pub use shutdown::{Shutdown, ShutdownToken};

use crate::application::audit::{AuditStats, ComplianceAuditor};
use crate::application::container_health::{HealthChecker, SweepStats};
use crate::application::dispatch::{DispatchStats, NotificationDispatcher};
use crate::error::{AppError, Result};
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Loop intervals and sweep behavior
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub dispatch_interval_secs: u64,
    pub audit_interval_secs: u64,
    pub sweep_interval_secs: u64,
    pub maintenance_interval_hours: u64,
    /// Repair unhealthy containers during the sweep (not just report)
    pub sweep_auto_repair: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_secs: constants::DEFAULT_DISPATCH_INTERVAL_SECS,
            audit_interval_secs: constants::DEFAULT_AUDIT_INTERVAL_SECS,
            sweep_interval_secs: constants::DEFAULT_SWEEP_INTERVAL_SECS,
            maintenance_interval_hours: constants::DEFAULT_MAINTENANCE_INTERVAL_HOURS,
            sweep_auto_repair: true,
        }
    }
}

impl ScheduleConfig {
    // tokio::time::interval panics on a zero period, so misconfigured
    // env values are clamped to one second
    fn period(secs: u64) -> Duration {
        Duration::from_secs(secs.max(1))
    }

    pub fn dispatch_period(&self) -> Duration {
        Self::period(self.dispatch_interval_secs)
    }

    pub fn audit_period(&self) -> Duration {
        Self::period(self.audit_interval_secs)
    }

    pub fn sweep_period(&self) -> Duration {
        Self::period(self.sweep_interval_secs)
    }

    pub fn maintenance_period(&self) -> Duration {
        Self::period(self.maintenance_interval_hours.saturating_mul(3600))
    }
}

/// Owns the scheduled tasks and their overlap guards
pub struct ScheduleRunner {
    dispatcher: Arc<NotificationDispatcher>,
    auditor: Arc<ComplianceAuditor>,
    health_checker: Arc<HealthChecker>,
    maintenance: Arc<dyn Maintenance>,
    maintenance_config: MaintenanceConfig,
    config: ScheduleConfig,

    dispatch_guard: OverlapGuard,
    audit_guard: OverlapGuard,
    sweep_guard: OverlapGuard,
    maintenance_guard: OverlapGuard,
}

impl ScheduleRunner {
    pub fn new(
        dispatcher: Arc<NotificationDispatcher>,
        auditor: Arc<ComplianceAuditor>,
        health_checker: Arc<HealthChecker>,
        maintenance: Arc<dyn Maintenance>,
        maintenance_config: MaintenanceConfig,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            dispatcher,
            auditor,
            health_checker,
            maintenance,
            maintenance_config,
            config,
            dispatch_guard: OverlapGuard::new("dispatch"),
            audit_guard: OverlapGuard::new("compliance_audit"),
            sweep_guard: OverlapGuard::new("container_sweep"),
            maintenance_guard: OverlapGuard::new("maintenance"),
        }
    }

    /// One overlap-guarded dispatch pass (also the manual RPC trigger)
    pub async fn run_dispatch(&self) -> Result<DispatchStats> {
        let _permit = self
            .dispatch_guard
            .try_acquire()
            .ok_or_else(|| AppError::Conflict("Dispatch already running".to_string()))?;
        self.dispatcher.run().await
    }

    /// One overlap-guarded compliance audit
    pub async fn run_audit(&self) -> Result<AuditStats> {
        let _permit = self
            .audit_guard
            .try_acquire()
            .ok_or_else(|| AppError::Conflict("Audit already running".to_string()))?;
        self.auditor.run().await
    }

    /// One overlap-guarded container sweep
    pub async fn run_sweep(&self) -> Result<SweepStats> {
        let _permit = self
            .sweep_guard
            .try_acquire()
            .ok_or_else(|| AppError::Conflict("Container sweep already running".to_string()))?;
        self.health_checker.sweep(self.config.sweep_auto_repair).await
    }

    /// One overlap-guarded maintenance run (also the manual RPC trigger)
    pub async fn run_maintenance(&self) -> Result<MaintenanceStats> {
        let _permit = self
            .maintenance_guard
            .try_acquire()
            .ok_or_else(|| AppError::Conflict("Maintenance already running".to_string()))?;
        self.maintenance
            .run_full_maintenance(&self.maintenance_config)
            .await
    }

    /// Spawn all four loops. Each stops when the shutdown token fires.
    pub fn spawn_all(self: &Arc<Self>, token: ShutdownToken) -> Vec<JoinHandle<()>> {
        info!(
            dispatch_secs = self.config.dispatch_interval_secs,
            audit_secs = self.config.audit_interval_secs,
            sweep_secs = self.config.sweep_interval_secs,
            maintenance_hours = self.config.maintenance_interval_hours,
            "Schedule runner started"
        );

        let dispatch = {
            let runner = self.clone();
            let token = token.clone();
            let period = runner.config.dispatch_period();
            tokio::spawn(async move {
                runner
                    .run_loop("dispatch", period, token, |r| async move {
                        r.run_dispatch().await.map(|_| ())
                    })
                    .await;
            })
        };

        let audit = {
            let runner = self.clone();
            let token = token.clone();
            let period = runner.config.audit_period();
            tokio::spawn(async move {
                runner
                    .run_loop("compliance_audit", period, token, |r| async move {
                        r.run_audit().await.map(|_| ())
                    })
                    .await;
            })
        };

        let sweep = {
            let runner = self.clone();
            let token = token.clone();
            let period = runner.config.sweep_period();
            tokio::spawn(async move {
                runner
                    .run_loop("container_sweep", period, token, |r| async move {
                        r.run_sweep().await.map(|_| ())
                    })
                    .await;
            })
        };

        let maintenance = {
            let runner = self.clone();
            let period = self.config.maintenance_period();
            tokio::spawn(async move {
                runner
                    .run_loop("maintenance", period, token, |r| async move {
                        r.run_maintenance().await.map(|_| ())
                    })
                    .await;
            })
        };

        vec![dispatch, audit, sweep, maintenance]
    }

    async fn run_loop<F, Fut>(
        self: &Arc<Self>,
        name: &'static str,
        period: Duration,
        mut token: ShutdownToken,
        task: F,
    ) where
        F: Fn(Arc<Self>) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it, startup already
        // reconciled state
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match task(self.clone()).await {
                        Ok(()) => {}
                        Err(AppError::Conflict(_)) => {
                            // Overlap skip, already logged by the guard
                        }
                        Err(e) => {
                            error!(task = %name, error = %e, "Scheduled task failed");
                        }
                    }
                }
                _ = token.wait() => {
                    info!(task = %name, "Schedule loop stopped");
                    break;
                }
            }
        }
    }
}
