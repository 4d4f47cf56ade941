//! Assignment request model.
//!
//! A request is a posted job: course metadata, page count, deadline, and a
//! cost estimate (always a multiple of the fixed increment). Its status is
//! driven by the lifecycle in [`crate::lifecycle`]:
//!
//! ```text
//! open --accept--> assigned --complete | rate--> completed
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE assignment_requests (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     client_id UUID NOT NULL REFERENCES users(id),
//!     course_name VARCHAR(255) NOT NULL,
//!     course_code VARCHAR(50) NOT NULL,
//!     assignment_type VARCHAR(100) NOT NULL,
//!     num_pages INTEGER NOT NULL,
//!     deadline TIMESTAMPTZ NOT NULL,
//!     estimated_cost INTEGER NOT NULL,
//!     status request_status NOT NULL DEFAULT 'open',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Posted, visible to writers, not yet claimed
    Open,

    /// Claimed by exactly one writer; an assignment row exists
    Assigned,

    /// The paired assignment has finished
    Completed,
}

impl RequestStatus {
    /// Converts status to its database/string form
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Assigned => "assigned",
            RequestStatus::Completed => "completed",
        }
    }

    /// Checks whether the request can still be claimed
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Open)
    }

    /// Checks if a transition to `target` is valid
    ///
    /// The lifecycle is strictly forward: open → assigned → completed.
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        matches!(
            (self, target),
            (RequestStatus::Open, RequestStatus::Assigned)
                | (RequestStatus::Assigned, RequestStatus::Completed)
        )
    }
}

/// A posted assignment request
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignmentRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Posting client
    pub client_id: Uuid,

    /// Course this assignment belongs to
    pub course_name: String,

    /// Course code (e.g. "CS101")
    pub course_code: String,

    /// Kind of work (essay, lab report, ...)
    pub assignment_type: String,

    /// Expected length in pages
    pub num_pages: i32,

    /// Submission deadline
    pub deadline: DateTime<Utc>,

    /// Offered price, a multiple of the fixed increment
    pub estimated_cost: i32,

    /// Lifecycle state
    pub status: RequestStatus,

    /// When the request was posted
    pub created_at: DateTime<Utc>,
}

/// Sanitized input for creating a request
///
/// Produced by [`crate::lifecycle::create_request`], which applies field
/// truncation and cost normalization before anything is persisted.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub client_id: Uuid,
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: i32,
}

/// An open request as shown to browsing writers, with the posting
/// client's public summary joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OpenRequestRow {
    pub id: Uuid,
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: i32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_rating: f64,
    pub client_total_ratings: i32,
    pub client_profile_picture: Option<String>,
}

impl AssignmentRequest {
    /// Inserts a new request in `open` state
    pub async fn create(pool: &PgPool, data: CreateRequest) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, AssignmentRequest>(
            r#"
            INSERT INTO assignment_requests
                (client_id, course_name, course_code, assignment_type,
                 num_pages, deadline, estimated_cost, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open')
            RETURNING id, client_id, course_name, course_code, assignment_type,
                      num_pages, deadline, estimated_cost, status, created_at
            "#,
        )
        .bind(data.client_id)
        .bind(data.course_name)
        .bind(data.course_code)
        .bind(data.assignment_type)
        .bind(data.num_pages)
        .bind(data.deadline)
        .bind(data.estimated_cost)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a request by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, AssignmentRequest>(
            r#"
            SELECT id, client_id, course_name, course_code, assignment_type,
                   num_pages, deadline, estimated_cost, status, created_at
            FROM assignment_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Lists open requests for the browse view, newest first
    pub async fn list_open(pool: &PgPool) -> Result<Vec<OpenRequestRow>, sqlx::Error> {
        let requests = sqlx::query_as::<_, OpenRequestRow>(
            r#"
            SELECT ar.id, ar.course_name, ar.course_code, ar.assignment_type,
                   ar.num_pages, ar.deadline, ar.estimated_cost, ar.status,
                   ar.created_at,
                   u.id AS client_id,
                   u.name AS client_name,
                   u.rating AS client_rating,
                   u.total_ratings AS client_total_ratings,
                   u.profile_picture AS client_profile_picture
            FROM assignment_requests ar
            JOIN users u ON u.id = ar.client_id
            WHERE ar.status = 'open'
            ORDER BY ar.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }
}
