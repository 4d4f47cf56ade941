//! The assignment request lifecycle.
//!
//! One request moves through one forward-only lifecycle, shared with its
//! paired assignment:
//!
//! ```text
//! open --accept(writer)--> assigned(in_progress) --complete | rate--> completed
//! ```
//!
//! Completion has two triggering events (the writer's explicit action and
//! a submitted rating) but exactly one transition: both paths funnel
//! through `complete_in_progress`, so the side effects can never diverge.
//!
//! Every mutating operation here is a single database transaction. The
//! accept race is resolved by a conditional update (`WHERE status =
//! 'open'`): the first transaction to commit wins, the loser observes zero
//! updated rows and gets [`LifecycleError::RequestNotOpen`]. No locks are
//! taken beyond what the store implies, and no transaction is held across
//! an external call.

use crate::models::assignment::Assignment;
use crate::models::request::{AssignmentRequest, CreateRequest};
use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres};
use thiserror::Error;
use uuid::Uuid;

/// Cost estimates are normalized to multiples of this increment
pub const COST_INCREMENT: f64 = 50.0;

/// Column limit for `course_name`
pub const COURSE_NAME_MAX: usize = 255;

/// Column limit for `course_code`
pub const COURSE_CODE_MAX: usize = 50;

/// Column limit for `assignment_type`
pub const ASSIGNMENT_TYPE_MAX: usize = 100;

/// Lifecycle operation error
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The request does not exist or was claimed by another writer first
    #[error("request {0} not found or already assigned")]
    RequestNotOpen(Uuid),

    /// No assignment with this ID
    #[error("assignment {0} not found")]
    AssignmentNotFound(Uuid),

    /// Someone other than the assignment's writer tried to complete it
    #[error("only the assignment's writer may complete it")]
    NotAssignmentWriter,

    /// Rating score outside 1-5
    #[error("score {0} is outside the 1-5 range")]
    ScoreOutOfRange(i16),

    /// Underlying store failure; the operation's transaction was rolled
    /// back
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Raw client input for posting a request
///
/// Text fields are truncated to their column limits rather than rejected
/// (longstanding leniency policy), and the cost estimate is normalized to
/// the nearest multiple of [`COST_INCREMENT`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequestInput {
    pub course_name: String,
    pub course_code: String,
    pub assignment_type: String,
    pub num_pages: i32,
    pub deadline: DateTime<Utc>,
    pub estimated_cost: f64,
}

/// Result of a successful accept: the claimed request plus the client's
/// contact number
///
/// This is the only point in the system where contact information crosses
/// from one party to the other.
#[derive(Debug, Clone)]
pub struct AcceptedRequest {
    /// The request, now `assigned`
    pub request: AssignmentRequest,

    /// The posting client's WhatsApp number, if they have set one
    pub client_whatsapp: Option<String>,
}

/// Input for submitting a rating
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRating {
    /// User being rated (the counterparty on the request)
    pub rated_id: Uuid,

    /// Request the rating refers to
    pub assignment_request_id: Uuid,

    /// Score, 1 through 5
    pub score: i16,

    /// Optional free-text comment
    pub comment: Option<String>,
}

/// Result of a rating submission
#[derive(Debug, Clone, Copy)]
pub struct RatingOutcome {
    /// Whether this submission also completed the paired assignment
    pub assignment_completed: bool,
}

/// The two events that can complete an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrigger {
    /// The assigned writer marked the work done
    WriterAction,

    /// A party submitted a rating for the request
    RatingSubmitted,
}

/// Which row the completion transition is keyed on
#[derive(Debug, Clone, Copy)]
enum CompletionKey {
    /// By assignment ID (writer-initiated path)
    Assignment(Uuid),

    /// By parent request ID (rating path)
    Request(Uuid),
}

/// Rounds a raw cost estimate to the nearest multiple of
/// [`COST_INCREMENT`], halves away from zero
///
/// 237 → 250, 225 → 250, 74 → 50.
pub fn normalize_cost(raw: f64) -> i32 {
    ((raw / COST_INCREMENT).round() * COST_INCREMENT) as i32
}

/// Truncates a string to at most `max_chars` characters, on a character
/// boundary
pub fn truncate_to(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Checks a rating score against the 1-5 scale
pub fn score_in_range(score: i16) -> bool {
    (1..=5).contains(&score)
}

/// Posts a new request in `open` state
///
/// Applies the truncation and cost-normalization policies before anything
/// is written; nothing is persisted if the insert fails.
pub async fn create_request(
    pool: &PgPool,
    client_id: Uuid,
    input: CreateRequestInput,
) -> Result<AssignmentRequest, LifecycleError> {
    let data = CreateRequest {
        client_id,
        course_name: truncate_to(&input.course_name, COURSE_NAME_MAX),
        course_code: truncate_to(&input.course_code, COURSE_CODE_MAX),
        assignment_type: truncate_to(&input.assignment_type, ASSIGNMENT_TYPE_MAX),
        num_pages: input.num_pages,
        deadline: input.deadline,
        estimated_cost: normalize_cost(input.estimated_cost),
    };

    let request = AssignmentRequest::create(pool, data).await?;

    tracing::info!(
        request_id = %request.id,
        client_id = %client_id,
        estimated_cost = request.estimated_cost,
        "Assignment request created"
    );

    Ok(request)
}

/// Claims an open request for a writer
///
/// Atomically, in one transaction:
/// 1. the request flips `open` → `assigned` (conditional update; the
///    single-winner guard),
/// 2. an assignment row is created linking writer and client,
/// 3. the writer's status is forced to `busy`.
///
/// After the commit the client's contact number is read and returned so
/// the two parties can talk out of band. A concurrent accept that loses
/// the race gets [`LifecycleError::RequestNotOpen`]; nothing it wrote
/// survives.
pub async fn accept_request(
    pool: &PgPool,
    request_id: Uuid,
    writer_id: Uuid,
) -> Result<AcceptedRequest, LifecycleError> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, AssignmentRequest>(
        r#"
        UPDATE assignment_requests
        SET status = 'assigned'
        WHERE id = $1 AND status = 'open'
        RETURNING id, client_id, course_name, course_code, assignment_type,
                  num_pages, deadline, estimated_cost, status, created_at
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(LifecycleError::RequestNotOpen(request_id))?;

    sqlx::query(
        r#"
        INSERT INTO assignments (request_id, writer_id, client_id, status)
        VALUES ($1, $2, $3, 'in_progress')
        "#,
    )
    .bind(request_id)
    .bind(writer_id)
    .bind(request.client_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET writer_status = 'busy' WHERE id = $1")
        .bind(writer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let client_whatsapp = User::whatsapp_number(pool, request.client_id).await?;

    tracing::info!(
        request_id = %request_id,
        writer_id = %writer_id,
        client_id = %request.client_id,
        "Request accepted"
    );

    Ok(AcceptedRequest {
        request,
        client_whatsapp,
    })
}

/// Marks an assignment's work as done, writer-initiated
///
/// Only the assignment's writer is authorized; anyone else gets
/// [`LifecycleError::NotAssignmentWriter`]. Completing an
/// already-completed assignment is a no-op that returns the current row.
pub async fn complete_assignment(
    pool: &PgPool,
    assignment_id: Uuid,
    caller: Uuid,
) -> Result<Assignment, LifecycleError> {
    let assignment = Assignment::find_by_id(pool, assignment_id)
        .await?
        .ok_or(LifecycleError::AssignmentNotFound(assignment_id))?;

    if assignment.writer_id != caller {
        return Err(LifecycleError::NotAssignmentWriter);
    }

    match complete_in_progress(
        pool,
        CompletionKey::Assignment(assignment_id),
        CompletionTrigger::WriterAction,
    )
    .await?
    {
        Some(completed) => Ok(completed),
        // Already completed earlier (possibly via the rating path).
        None => Ok(assignment),
    }
}

/// Records a rating and applies its side effects, all in one transaction
///
/// 1. Upserts the rating keyed on (rater, request); a resubmission
///    replaces score, comment and timestamp in place.
/// 2. Recomputes the rated user's average and count from all ratings
///    where they are the rated party.
/// 3. Completes the request's assignment if one exists and is still in
///    progress. A rating submitted before any assignment exists is still
///    recorded; only the completion side effect is skipped.
pub async fn submit_rating(
    pool: &PgPool,
    rater_id: Uuid,
    input: SubmitRating,
) -> Result<RatingOutcome, LifecycleError> {
    if !score_in_range(input.score) {
        return Err(LifecycleError::ScoreOutOfRange(input.score));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO ratings (rater_id, rated_id, assignment_request_id, score, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (rater_id, assignment_request_id)
        DO UPDATE SET score = EXCLUDED.score,
                      comment = EXCLUDED.comment,
                      created_at = NOW()
        "#,
    )
    .bind(rater_id)
    .bind(input.rated_id)
    .bind(input.assignment_request_id)
    .bind(input.score)
    .bind(&input.comment)
    .execute(&mut *tx)
    .await?;

    // The aggregate is derived state; it is never written anywhere else.
    sqlx::query(
        r#"
        UPDATE users
        SET rating = COALESCE(stats.avg_score, 0),
            total_ratings = COALESCE(stats.n, 0)
        FROM (
            SELECT AVG(score::float8) AS avg_score, COUNT(*)::int AS n
            FROM ratings
            WHERE rated_id = $1
        ) AS stats
        WHERE users.id = $1
        "#,
    )
    .bind(input.rated_id)
    .execute(&mut *tx)
    .await?;

    let completed = complete_in_progress(
        &mut *tx,
        CompletionKey::Request(input.assignment_request_id),
        CompletionTrigger::RatingSubmitted,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        rater_id = %rater_id,
        rated_id = %input.rated_id,
        request_id = %input.assignment_request_id,
        score = input.score,
        assignment_completed = completed.is_some(),
        "Rating recorded"
    );

    Ok(RatingOutcome {
        assignment_completed: completed.is_some(),
    })
}

/// The one `in_progress` → `completed` transition
///
/// Both completion triggers end up here; the conditional `WHERE status =
/// 'in_progress'` makes the transition idempotent and forward-only.
/// Returns `None` when no in-progress row matched (no assignment yet, or
/// already completed).
async fn complete_in_progress<'e, E>(
    executor: E,
    key: CompletionKey,
    trigger: CompletionTrigger,
) -> Result<Option<Assignment>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let (sql, id) = match key {
        CompletionKey::Assignment(id) => (
            r#"
            UPDATE assignments
            SET status = 'completed', completed_at = NOW()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING id, request_id, writer_id, client_id, status,
                      created_at, completed_at
            "#,
            id,
        ),
        CompletionKey::Request(id) => (
            r#"
            UPDATE assignments
            SET status = 'completed', completed_at = NOW()
            WHERE request_id = $1 AND status = 'in_progress'
            RETURNING id, request_id, writer_id, client_id, status,
                      created_at, completed_at
            "#,
            id,
        ),
    };

    let completed = sqlx::query_as::<_, Assignment>(sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    if let Some(ref assignment) = completed {
        tracing::info!(
            assignment_id = %assignment.id,
            request_id = %assignment.request_id,
            trigger = ?trigger,
            "Assignment completed"
        );
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cost_rounds_to_increment() {
        assert_eq!(normalize_cost(237.0), 250);
        assert_eq!(normalize_cost(225.0), 250); // half rounds away from zero
        assert_eq!(normalize_cost(224.9), 200);
        assert_eq!(normalize_cost(74.0), 50);
        assert_eq!(normalize_cost(75.0), 100);
        assert_eq!(normalize_cost(0.0), 0);
        assert_eq!(normalize_cost(50.0), 50);
        assert_eq!(normalize_cost(12345.6), 12350);
    }

    #[test]
    fn test_truncate_to_char_boundaries() {
        assert_eq!(truncate_to("short", 255), "short");
        assert_eq!(truncate_to("abcdef", 3), "abc");
        // Multibyte input must not be split mid-character.
        assert_eq!(truncate_to("héllo wörld", 5), "héllo");
        assert_eq!(truncate_to("", 10), "");
    }

    #[test]
    fn test_score_in_range() {
        for score in 1..=5 {
            assert!(score_in_range(score));
        }
        assert!(!score_in_range(0));
        assert!(!score_in_range(6));
        assert!(!score_in_range(-3));
    }

    #[test]
    fn test_create_request_input_sanitization_shape() {
        let long_name = "n".repeat(300);
        assert_eq!(truncate_to(&long_name, COURSE_NAME_MAX).len(), 255);

        let long_code = "c".repeat(80);
        assert_eq!(truncate_to(&long_code, COURSE_CODE_MAX).len(), 50);

        let long_type = "t".repeat(150);
        assert_eq!(truncate_to(&long_type, ASSIGNMENT_TYPE_MAX).len(), 100);
    }

    // Transactional behavior (single-winner accept, idempotent re-rating,
    // rating-triggers-completion) is covered against a live database in
    // tests/lifecycle_tests.rs.
}
