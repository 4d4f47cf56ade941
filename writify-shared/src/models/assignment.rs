//! Assignment model.
//!
//! An assignment exists if and only if its parent request has been
//! accepted; it is created inside the accept transaction and never
//! outlives the request. Completion is reached on two paths (the writer's
//! explicit action or a submitted rating), both funneled through the
//! single transition in [`crate::lifecycle`].
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE assignments (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     request_id UUID NOT NULL UNIQUE REFERENCES assignment_requests(id),
//!     writer_id UUID NOT NULL REFERENCES users(id),
//!     client_id UUID NOT NULL REFERENCES users(id),
//!     status assignment_status NOT NULL DEFAULT 'in_progress',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     completed_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Assignment execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Accepted and being worked on
    InProgress,

    /// Finished; `completed_at` is set
    Completed,
}

impl AssignmentStatus {
    /// Converts status to its database/string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }

    /// Checks if the assignment has reached its terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Completed)
    }
}

/// The accepted pairing of a writer to a request
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    /// Unique assignment ID
    pub id: Uuid,

    /// Parent request (1:1)
    pub request_id: Uuid,

    /// Writer who accepted
    pub writer_id: Uuid,

    /// Client, denormalized from the request
    pub client_id: Uuid,

    /// Execution state
    pub status: AssignmentStatus,

    /// When the request was accepted
    pub created_at: DateTime<Utc>,

    /// When the work finished (null while in progress)
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of the "my assignments" view: request fields plus both
/// parties' public profiles and contact numbers
///
/// Contact numbers appear here because both sides of a matched pair have
/// already been introduced at accept time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignmentView {
    pub request_id: Uuid,
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: i32,
    pub status: Option<AssignmentStatus>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub writer_id: Option<Uuid>,
    pub writer_name: Option<String>,
    pub writer_email: Option<String>,
    pub writer_profile_picture: Option<String>,
    pub writer_rating: Option<f64>,
    pub writer_total_ratings: Option<i32>,
    pub writer_whatsapp_number: Option<String>,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_profile_picture: Option<String>,
    pub client_rating: f64,
    pub client_total_ratings: i32,
    pub client_whatsapp_number: Option<String>,
}

impl Assignment {
    /// Finds an assignment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, request_id, writer_id, client_id, status,
                   created_at, completed_at
            FROM assignments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(assignment)
    }

    /// Finds the assignment paired with a request, if the request has been
    /// accepted
    pub async fn find_by_request(
        pool: &PgPool,
        request_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, request_id, writer_id, client_id, status,
                   created_at, completed_at
            FROM assignments
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(pool)
        .await?;

        Ok(assignment)
    }

    /// Lists a client's requests with any paired assignment and writer,
    /// newest request first
    ///
    /// Unaccepted requests appear with null assignment/writer columns.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: Uuid,
    ) -> Result<Vec<AssignmentView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentView>(
            r#"
            SELECT ar.id AS request_id,
                   ar.course_name, ar.course_code, ar.assignment_type,
                   ar.num_pages, ar.deadline, ar.estimated_cost,
                   a.status AS status,
                   a.created_at AS assigned_at,
                   a.completed_at,
                   w.id AS writer_id,
                   w.name AS writer_name,
                   w.email AS writer_email,
                   w.profile_picture AS writer_profile_picture,
                   w.rating AS writer_rating,
                   w.total_ratings AS writer_total_ratings,
                   w.whatsapp_number AS writer_whatsapp_number,
                   c.id AS client_id,
                   c.name AS client_name,
                   c.email AS client_email,
                   c.profile_picture AS client_profile_picture,
                   c.rating AS client_rating,
                   c.total_ratings AS client_total_ratings,
                   c.whatsapp_number AS client_whatsapp_number
            FROM assignment_requests ar
            LEFT JOIN assignments a ON a.request_id = ar.id
            LEFT JOIN users w ON w.id = a.writer_id
            JOIN users c ON c.id = ar.client_id
            WHERE ar.client_id = $1
            ORDER BY ar.created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Lists the assignments a writer has accepted, newest first
    pub async fn list_for_writer(
        pool: &PgPool,
        writer_id: Uuid,
    ) -> Result<Vec<AssignmentView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentView>(
            r#"
            SELECT ar.id AS request_id,
                   ar.course_name, ar.course_code, ar.assignment_type,
                   ar.num_pages, ar.deadline, ar.estimated_cost,
                   a.status AS status,
                   a.created_at AS assigned_at,
                   a.completed_at,
                   w.id AS writer_id,
                   w.name AS writer_name,
                   w.email AS writer_email,
                   w.profile_picture AS writer_profile_picture,
                   w.rating AS writer_rating,
                   w.total_ratings AS writer_total_ratings,
                   w.whatsapp_number AS writer_whatsapp_number,
                   c.id AS client_id,
                   c.name AS client_name,
                   c.email AS client_email,
                   c.profile_picture AS client_profile_picture,
                   c.rating AS client_rating,
                   c.total_ratings AS client_total_ratings,
                   c.whatsapp_number AS client_whatsapp_number
            FROM assignments a
            JOIN assignment_requests ar ON ar.id = a.request_id
            JOIN users w ON w.id = a.writer_id
            JOIN users c ON c.id = ar.client_id
            WHERE a.writer_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(writer_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
