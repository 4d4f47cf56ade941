//! Assignment request endpoints.
//!
//! - `POST /v1/requests`: post a request (validation, truncation, cost
//!   normalization; state `open`)
//! - `GET /v1/requests`: browse open requests, newest first
//! - `POST /v1/requests/:id/accept`: claim an open request
//!
//! Accepting is first-committer-wins: the conditional update inside
//! [`writify_shared::lifecycle::accept_request`] lets exactly one of two
//! concurrent writers through; the loser gets 404 "not found or already
//! assigned". The winner's response carries the client's WhatsApp number
//! so the two can talk out of band.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use writify_shared::auth::middleware::AuthContext;
use writify_shared::lifecycle::{self, CreateRequestInput};
use writify_shared::models::request::{AssignmentRequest, RequestStatus};

/// Payload for posting a request
///
/// Deliberately no maximum lengths here: oversized text fields are
/// truncated to their column limits, not rejected.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestPayload {
    /// Course the assignment belongs to
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,

    /// Course code
    #[validate(length(min = 1, message = "Course code is required"))]
    pub course_code: String,

    /// Kind of work
    #[validate(length(min = 1, message = "Assignment type is required"))]
    pub assignment_type: String,

    /// Expected length in pages
    #[validate(range(min = 1, message = "Number of pages must be positive"))]
    pub num_pages: i32,

    /// Submission deadline
    pub deadline: DateTime<Utc>,

    /// Offered price; normalized to the nearest multiple of 50
    #[validate(range(min = 0.0, message = "Estimated cost must not be negative"))]
    pub estimated_cost: f64,
}

/// Public summary of the posting client shown to browsing writers
#[derive(Debug, Serialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
    pub rating: f64,
    pub total_ratings: i32,
    pub profile_picture: Option<String>,
}

/// One browsable open request
#[derive(Debug, Serialize)]
pub struct BrowseRequest {
    pub id: Uuid,
    pub client: ClientSummary,
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: i32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Accept response: the claimed request plus the client's contact number
#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    #[serde(flatten)]
    pub request: AssignmentRequest,

    /// The posting client's WhatsApp number, for out-of-band contact
    pub client_whatsapp: Option<String>,
}

/// `POST /v1/requests`
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateRequestPayload>,
) -> ApiResult<(StatusCode, Json<AssignmentRequest>)> {
    payload.validate()?;

    let input = CreateRequestInput {
        course_name: payload.course_name,
        course_code: payload.course_code,
        assignment_type: payload.assignment_type,
        num_pages: payload.num_pages,
        deadline: payload.deadline,
        estimated_cost: payload.estimated_cost,
    };

    let request = lifecycle::create_request(&state.db, auth.user_id, input).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /v1/requests`
pub async fn list_open_requests(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BrowseRequest>>> {
    let rows = AssignmentRequest::list_open(&state.db).await?;

    let requests = rows
        .into_iter()
        .map(|row| BrowseRequest {
            id: row.id,
            client: ClientSummary {
                id: row.client_id,
                name: row.client_name,
                rating: row.client_rating,
                total_ratings: row.client_total_ratings,
                profile_picture: row.client_profile_picture,
            },
            course_name: row.course_name,
            course_code: row.course_code,
            assignment_type: row.assignment_type,
            num_pages: row.num_pages,
            deadline: row.deadline,
            estimated_cost: row.estimated_cost,
            status: row.status,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(requests))
}

/// `POST /v1/requests/:id/accept`
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AcceptResponse>> {
    let accepted = lifecycle::accept_request(&state.db, id, auth.user_id).await?;

    Ok(Json(AcceptResponse {
        request: accepted.request,
        client_whatsapp: accepted.client_whatsapp,
    }))
}
