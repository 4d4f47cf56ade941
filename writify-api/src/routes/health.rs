//! Health check endpoint.
//!
//! `GET /health` returns service status plus database connectivity:
//!
//! ```json
//! { "status": "healthy", "version": "0.1.0", "database": "connected" }
//! ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: healthy or degraded
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status: connected or disconnected
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match writify_shared::db::pool::health_check(&state.db).await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(HealthResponse {
        status: if database == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}
