//! Assignment endpoints.
//!
//! - `GET /v1/assignments`: the caller's assignments, shaped by their
//!   role: clients see every request they posted (accepted or not),
//!   writers see the assignments they claimed
//! - `PUT /v1/assignments/:id/complete`: writer marks the work done
//!
//! Each row carries `has_rated_writer` / `has_rated_client` so the
//! frontend knows whether to offer the rating dialog.

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use writify_shared::auth::middleware::AuthContext;
use writify_shared::lifecycle;
use writify_shared::models::assignment::{Assignment, AssignmentView};
use writify_shared::models::rating::Rating;
use writify_shared::models::user::User;

/// One party of an assignment as shown to the other
///
/// Matched parties have already been introduced, so contact numbers are
/// included here.
#[derive(Debug, Serialize)]
pub struct PartyInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub rating: f64,
    pub total_ratings: i32,
    pub whatsapp_number: Option<String>,
}

/// One row of the "my assignments" view
#[derive(Debug, Serialize)]
pub struct MyAssignment {
    pub request_id: Uuid,
    pub writer: Option<PartyInfo>,
    pub client: PartyInfo,
    /// `in_progress` / `completed`, or `pending` for a request nobody has
    /// accepted yet
    pub status: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: i32,
    pub has_rated_writer: bool,
    pub has_rated_client: bool,
}

/// Role-shaped listing response
#[derive(Debug, Serialize)]
pub struct MyAssignmentsResponse {
    /// The view the caller got: client or writer
    pub role: String,

    /// Their assignments, newest first
    pub assignments: Vec<MyAssignment>,
}

/// `GET /v1/assignments`
pub async fn my_assignments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MyAssignmentsResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))?;

    // Accounts on the default role act as clients.
    let effective_role = match user.role.as_str() {
        "writer" => "writer",
        "student" | "client" => "client",
        _ => return Err(ApiError::Forbidden("Invalid user role".to_string())),
    };

    let rows = if effective_role == "writer" {
        Assignment::list_for_writer(&state.db, user.id).await?
    } else {
        Assignment::list_for_client(&state.db, user.id).await?
    };

    let rated = Rating::rated_by(&state.db, user.id).await?;

    let assignments = rows
        .into_iter()
        .map(|row| shape_row(row, &rated))
        .collect();

    Ok(Json(MyAssignmentsResponse {
        role: effective_role.to_string(),
        assignments,
    }))
}

/// `PUT /v1/assignments/:id/complete`
pub async fn complete_assignment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Assignment>> {
    let assignment = lifecycle::complete_assignment(&state.db, id, auth.user_id).await?;
    Ok(Json(assignment))
}

fn shape_row(row: AssignmentView, rated: &std::collections::HashMap<Uuid, Uuid>) -> MyAssignment {
    let writer = match (row.writer_id, row.writer_name, row.writer_email) {
        (Some(id), Some(name), Some(email)) => Some(PartyInfo {
            id,
            name,
            email,
            profile_picture: row.writer_profile_picture,
            rating: row.writer_rating.unwrap_or(0.0),
            total_ratings: row.writer_total_ratings.unwrap_or(0),
            whatsapp_number: row.writer_whatsapp_number,
        }),
        _ => None,
    };

    let client = PartyInfo {
        id: row.client_id,
        name: row.client_name,
        email: row.client_email,
        profile_picture: row.client_profile_picture,
        rating: row.client_rating,
        total_ratings: row.client_total_ratings,
        whatsapp_number: row.client_whatsapp_number,
    };

    let has_rated = |party: Option<Uuid>| {
        party
            .map(|id| rated.get(&row.request_id) == Some(&id))
            .unwrap_or(false)
    };
    let has_rated_writer = has_rated(writer.as_ref().map(|w| w.id));
    let has_rated_client = has_rated(Some(client.id));

    MyAssignment {
        request_id: row.request_id,
        writer,
        client,
        status: row
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "pending".to_string()),
        assigned_at: row.assigned_at,
        completed_at: row.completed_at,
        course_name: row.course_name,
        course_code: row.course_code,
        assignment_type: row.assignment_type,
        num_pages: row.num_pages,
        deadline: row.deadline,
        estimated_cost: row.estimated_cost,
        has_rated_writer,
        has_rated_client,
    }
}
