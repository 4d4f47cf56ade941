//! Administrative endpoints.
//!
//! `POST /v1/admin/retention-sweep` runs the same retention sweep the
//! worker triggers daily and returns its audit report. A sweep already
//! holding the lock answers 409 without touching anything.

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{extract::State, Json};
use writify_shared::retention::{run_sweep, SweepOutcome, SweepReport, DEFAULT_RETENTION_DAYS};

/// `POST /v1/admin/retention-sweep`
pub async fn trigger_sweep(State(state): State<AppState>) -> ApiResult<Json<SweepReport>> {
    tracing::info!("Manual retention sweep triggered");

    match run_sweep(&state.db, DEFAULT_RETENTION_DAYS).await? {
        SweepOutcome::Completed(report) => Ok(Json(report)),
        SweepOutcome::AlreadyRunning => Err(ApiError::Conflict(
            "A retention sweep is already running".to_string(),
        )),
    }
}
