//! Configuration for the retention worker.
//!
//! Environment variables (a `.env` file is honored in development):
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 5; the worker only
//!   ever runs one sweep at a time)
//! - `RETENTION_DAYS`: retention window (default 183, six months)
//! - `SWEEP_INTERVAL_SECS`: seconds between sweeps (default 86400, daily)
//! - `SWEEP_ON_STARTUP`: `true` also runs one sweep shortly after boot
//! - `SWEEP_STARTUP_DELAY_SECS`: delay before that startup sweep
//!   (default 300), so a crash-looping deploy does not hammer the store

use std::env;
use writify_shared::db::pool::DatabaseConfig;
use writify_shared::retention::DEFAULT_RETENTION_DAYS;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database pool settings
    pub database: DatabaseConfig,

    /// Scheduler settings
    pub scheduler: SchedulerConfig,
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Retention window in days
    pub retention_days: i64,

    /// Seconds between sweep runs
    pub interval_secs: u64,

    /// Whether to run a sweep shortly after startup
    pub sweep_on_startup: bool,

    /// Delay before the startup sweep, seconds
    pub startup_delay_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            interval_secs: 86_400,
            sweep_on_startup: false,
            startup_delay_secs: 300,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let defaults = SchedulerConfig::default();

        let retention_days = env::var("RETENTION_DAYS")
            .map(|v| v.parse::<i64>())
            .unwrap_or(Ok(defaults.retention_days))?;
        let interval_secs = env::var("SWEEP_INTERVAL_SECS")
            .map(|v| v.parse::<u64>())
            .unwrap_or(Ok(defaults.interval_secs))?;
        let sweep_on_startup = env::var("SWEEP_ON_STARTUP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.sweep_on_startup);
        let startup_delay_secs = env::var("SWEEP_STARTUP_DELAY_SECS")
            .map(|v| v.parse::<u64>())
            .unwrap_or(Ok(defaults.startup_delay_secs))?;

        if retention_days <= 0 {
            anyhow::bail!("RETENTION_DAYS must be positive");
        }

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            scheduler: SchedulerConfig {
                retention_days,
                interval_secs,
                sweep_on_startup,
                startup_delay_secs,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.retention_days, 183);
        assert_eq!(config.interval_secs, 86_400);
        assert!(!config.sweep_on_startup);
        assert_eq!(config.startup_delay_secs, 300);
    }
}
