//! PostgreSQL connection pool management.
//!
//! Every binary acquires its store access through [`create_pool`]; nothing
//! in the workspace holds a module-level connection. The pool is passed
//! explicitly to each procedure that needs it.
//!
//! # Example
//!
//! ```no_run
//! use writify_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), sqlx::Error> {
//! let config = DatabaseConfig {
//!     url: std::env::var("DATABASE_URL").unwrap(),
//!     ..Default::default()
//! };
//! let pool = create_pool(config).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the database connection pool
///
/// Timeouts are in seconds so they can be read directly from environment
/// variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections to keep warm
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_seconds: u64,

    /// How long a connection may sit idle before being closed (seconds);
    /// `None` keeps idle connections forever
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
        }
    }
}

/// Creates a PostgreSQL connection pool and verifies connectivity
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database is unreachable,
/// or the health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

    if let Some(idle) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle));
    }

    let pool = options.connect(&config.url).await?;

    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs a trivial query to verify the database is reachable
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(sqlx::Error::Protocol(
            "health check returned unexpected value".into(),
        ));
    }

    Ok(())
}

/// Gracefully closes the connection pool on shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}
