//! Writer directory endpoints.
//!
//! - `GET /v1/writers`: every account, best-rated first, with the
//!   portfolio sample joined in
//! - `GET /v1/writers/:id`: one directory entry
//!
//! Contact numbers never appear here; they are only surfaced to the
//! winning writer when a request is accepted.

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use writify_shared::models::user::{User, WriterListing};

/// `GET /v1/writers`
pub async fn list_writers(State(state): State<AppState>) -> ApiResult<Json<Vec<WriterListing>>> {
    let writers = User::list_writers(&state.db).await?;
    Ok(Json(writers))
}

/// `GET /v1/writers/:id`
pub async fn get_writer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WriterListing>> {
    let writer = User::find_writer(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Writer not found".to_string()))?;

    Ok(Json(writer))
}
