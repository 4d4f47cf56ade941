//! Database migration runner.
//!
//! Migrations live in `writify-shared/migrations/` and are embedded into
//! the binaries at compile time with `sqlx::migrate!`, so a deployed
//! server can bring an empty database up to the current schema on boot.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Runs all pending database migrations
///
/// Each migration runs in its own transaction; a failing migration is
/// rolled back and reported.
///
/// # Errors
///
/// Returns an error if a migration file fails to apply or the database
/// connection is lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Creates the database if it does not exist
///
/// Useful for development and tests; production databases are expected to
/// be provisioned ahead of time.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}
