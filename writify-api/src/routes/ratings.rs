//! Rating endpoints.
//!
//! - `POST /v1/ratings`: rate the counterparty on a request. Upsert
//!   semantics: a resubmission replaces the earlier judgment instead of
//!   adding a second one. The same transaction recomputes the rated
//!   user's aggregate and completes the paired assignment if it is still
//!   in progress.
//! - `GET /v1/ratings/mine`: the caller's aggregate plus received
//!   ratings.

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use writify_shared::auth::middleware::AuthContext;
use writify_shared::lifecycle::{self, SubmitRating};
use writify_shared::models::rating::Rating;
use writify_shared::models::user::User;

/// Payload for submitting a rating
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingPayload {
    /// User being rated
    pub rated_id: Uuid,

    /// Request the rating refers to
    pub assignment_request_id: Uuid,

    /// Score, 1 through 5
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: i16,

    /// Optional free-text comment
    pub comment: Option<String>,
}

/// Rating submission response
#[derive(Debug, Serialize)]
pub struct SubmitRatingResponse {
    /// Human-readable confirmation
    pub message: String,

    /// Whether this submission also completed the paired assignment
    pub assignment_completed: bool,
}

/// The caller's rating summary
#[derive(Debug, Serialize)]
pub struct MyRatingsResponse {
    /// Ratings received, newest first
    pub ratings: Vec<Rating>,

    /// Current average
    pub average_rating: f64,

    /// Number of ratings backing the average
    pub total_ratings: i32,
}

/// `POST /v1/ratings`
pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SubmitRatingPayload>,
) -> ApiResult<(StatusCode, Json<SubmitRatingResponse>)> {
    payload.validate()?;

    let outcome = lifecycle::submit_rating(
        &state.db,
        auth.user_id,
        SubmitRating {
            rated_id: payload.rated_id,
            assignment_request_id: payload.assignment_request_id,
            score: payload.score,
            comment: payload.comment,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRatingResponse {
            message: "Rating submitted successfully".to_string(),
            assignment_completed: outcome.assignment_completed,
        }),
    ))
}

/// `GET /v1/ratings/mine`
pub async fn my_ratings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MyRatingsResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))?;

    let ratings = Rating::list_for_rated(&state.db, user.id).await?;

    Ok(Json(MyRatingsResponse {
        ratings,
        average_rating: user.rating,
        total_ratings: user.total_ratings,
    }))
}
