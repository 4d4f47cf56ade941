//! Sweep scheduler.
//!
//! Runs the retention sweep once per configured interval, plus optionally
//! once shortly after startup (with a delay, so the worker does not race
//! its own deployment). A sweep runs to completion before the next tick
//! is considered; if one invocation somehow meets another (a second
//! worker, or the manual API trigger), the sweep's advisory lock makes
//! the latecomer a no-op.
//!
//! Shutdown is cooperative via a [`CancellationToken`]: the loop exits at
//! the next await point, never mid-transaction.
//!
//! # Example
//!
//! ```no_run
//! use writify_worker::config::SchedulerConfig;
//! use writify_worker::scheduler::SweepScheduler;
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> anyhow::Result<()> {
//! let scheduler = SweepScheduler::new(pool, SchedulerConfig::default());
//! let shutdown = scheduler.shutdown_token();
//!
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     shutdown.cancel();
//! });
//!
//! scheduler.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::SchedulerConfig;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use writify_shared::retention::{run_sweep, SweepOutcome};

/// Drives the retention sweep on a fixed schedule
pub struct SweepScheduler {
    /// Database connection pool
    db: PgPool,

    /// Scheduler settings
    config: SchedulerConfig,

    /// Shutdown token
    shutdown: CancellationToken,
}

impl SweepScheduler {
    /// Creates a scheduler
    pub fn new(db: PgPool, config: SchedulerConfig) -> Self {
        Self {
            db,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token external handlers cancel to stop the loop
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the scheduler loop until shutdown
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            retention_days = self.config.retention_days,
            interval_secs = self.config.interval_secs,
            sweep_on_startup = self.config.sweep_on_startup,
            "Sweep scheduler starting"
        );

        if self.config.sweep_on_startup {
            let delay = Duration::from_secs(self.config.startup_delay_secs);
            tracing::info!(delay_secs = delay.as_secs(), "Startup sweep scheduled");

            tokio::select! {
                _ = sleep(delay) => self.sweep_once().await,
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Sweep scheduler shut down before startup sweep");
                    return Ok(());
                }
            }
        }

        let interval = Duration::from_secs(self.config.interval_secs);

        loop {
            tokio::select! {
                _ = sleep(interval) => self.sweep_once().await,
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Sweep scheduler shut down");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one sweep, logging instead of propagating failures
    ///
    /// A failed sweep rolled back cleanly; the next scheduled run
    /// re-evaluates from unchanged data, so there is nothing to retry
    /// here.
    async fn sweep_once(&self) {
        match run_sweep(&self.db, self.config.retention_days).await {
            Ok(SweepOutcome::Completed(report)) => {
                tracing::info!(
                    users_deleted = report.users_deleted,
                    "Scheduled sweep completed"
                );
            }
            Ok(SweepOutcome::AlreadyRunning) => {
                tracing::warn!("Scheduled sweep skipped: another sweep holds the lock");
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled sweep failed; will retry next interval");
            }
        }
    }
}
