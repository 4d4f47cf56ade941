//! # Writify Retention Worker
//!
//! Long-running process that enforces the data-retention policy: once per
//! interval (daily by default) it purges accounts older than the
//! retention window along with every dependent row, in one transaction.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p writify-worker
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use writify_shared::db::pool::{close_pool, create_pool};
use writify_worker::config::Config;
use writify_worker::scheduler::SweepScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "writify_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Writify worker v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let pool = create_pool(config.database.clone()).await?;

    let scheduler = SweepScheduler::new(pool.clone(), config.scheduler);
    let shutdown = scheduler.shutdown_token();

    let handle = tokio::spawn(async move { scheduler.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();

    handle.await??;
    close_pool(pool).await;

    Ok(())
}
