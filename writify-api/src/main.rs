//! # Writify API Server
//!
//! HTTP backend for the student/writer marketplace: Google sign-in with
//! institutional email enforcement, assignment request lifecycle
//! (post → accept → complete/rate), writer profiles and portfolios, and a
//! manual trigger for the retention sweep.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p writify-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use writify_api::app::{build_router, AppState};
use writify_api::config::Config;
use writify_shared::db::migrations::{ensure_database_exists, run_migrations};
use writify_shared::db::pool::create_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "writify_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Writify API v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url).await?;
    let pool = create_pool(config.database.clone()).await?;
    run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    } else {
        tracing::info!("Shutdown signal received");
    }
}
