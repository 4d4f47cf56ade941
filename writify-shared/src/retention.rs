//! Data-retention sweep.
//!
//! Accounts still on the default role whose creation time is older than
//! the retention window are purged together with every row that would
//! otherwise dangle. The store declares no cascading deletes, so ordering
//! is enforced here, child references before parents:
//!
//! 1. ratings where the user is rater or rated
//! 2. writer portfolios owned by the user
//! 3. assignments where the user is writer or client
//! 4. assignment requests owned by the user as client, plus requests
//!    whose accepted assignment's writer is being purged (those lose
//!    their only viable writer)
//! 5. the user rows themselves
//!
//! The whole sweep is one transaction; any failure rolls everything back
//! and the next scheduled run re-evaluates from unchanged data. Accounts
//! promoted past the default role are exempt regardless of age; that is
//! policy, not oversight.
//!
//! Concurrent invocations (a long-running sweep meeting the next trigger,
//! or a manual trigger racing the scheduler) are excluded with a
//! transaction-scoped advisory lock; the loser reports
//! [`SweepOutcome::AlreadyRunning`] and touches nothing.

use crate::models::user::DEFAULT_ROLE;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Default retention window: six months
pub const DEFAULT_RETENTION_DAYS: i64 = 183;

/// Advisory lock key guarding the sweep ("WRITIFYS" as big-endian bytes)
const SWEEP_LOCK_KEY: i64 = 0x5752_4954_4946_5953;

/// Sweep failure; the transaction was rolled back, no partial deletion
/// survives
#[derive(Debug, Error)]
pub enum SweepError {
    /// Underlying store failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a sweep invocation did
#[derive(Debug, Clone)]
pub enum SweepOutcome {
    /// The sweep ran to completion (possibly deleting nothing)
    Completed(SweepReport),

    /// Another sweep held the lock; this invocation did nothing
    AlreadyRunning,
}

/// Audit record of one committed sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Accounts created before this instant were eligible
    pub cutoff: DateTime<Utc>,

    /// Number of user rows removed
    pub users_deleted: u64,

    /// Emails of the removed accounts, for the audit log
    pub deleted_emails: Vec<String>,

    /// Dependent rows removed, per table
    pub ratings_deleted: u64,
    pub portfolios_deleted: u64,
    pub assignments_deleted: u64,
    pub requests_deleted: u64,
}

impl SweepReport {
    fn empty(cutoff: DateTime<Utc>) -> Self {
        SweepReport {
            cutoff,
            users_deleted: 0,
            deleted_emails: Vec::new(),
            ratings_deleted: 0,
            portfolios_deleted: 0,
            assignments_deleted: 0,
            requests_deleted: 0,
        }
    }
}

/// Computes the eligibility cutoff for a sweep starting at `now`
pub fn compute_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

/// Runs a sweep against the current wall clock
pub async fn run_sweep(pool: &PgPool, retention_days: i64) -> Result<SweepOutcome, SweepError> {
    run_sweep_at(pool, compute_cutoff(Utc::now(), retention_days)).await
}

/// Runs a sweep with an explicit cutoff
///
/// Selection: accounts with `created_at < cutoff` still carrying
/// [`DEFAULT_ROLE`]. Zero eligible accounts is a successful no-op that
/// still commits its (empty) transaction.
pub async fn run_sweep_at(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError> {
    tracing::info!(cutoff = %cutoff, "Starting retention sweep");

    let mut tx = pool.begin().await?;

    let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
        .bind(SWEEP_LOCK_KEY)
        .fetch_one(&mut *tx)
        .await?;

    if !locked {
        tracing::warn!("Another sweep is already running, skipping this invocation");
        return Ok(SweepOutcome::AlreadyRunning);
    }

    let user_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM users WHERE created_at < $1 AND role = $2",
    )
    .bind(cutoff)
    .bind(DEFAULT_ROLE)
    .fetch_all(&mut *tx)
    .await?;

    if user_ids.is_empty() {
        tx.commit().await?;
        tracing::info!("Retention sweep found no expired accounts");
        return Ok(SweepOutcome::Completed(SweepReport::empty(cutoff)));
    }

    tracing::info!(count = user_ids.len(), "Found expired accounts to purge");

    // Requests whose accepted assignment's writer is being purged lose
    // their only viable writer and go too. Collected before the
    // assignment rows are deleted out from under us.
    let orphaned_request_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT request_id FROM assignments WHERE writer_id = ANY($1)",
    )
    .bind(&user_ids)
    .fetch_all(&mut *tx)
    .await?;

    let ratings_deleted = sqlx::query(
        "DELETE FROM ratings WHERE rater_id = ANY($1) OR rated_id = ANY($1)",
    )
    .bind(&user_ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let portfolios_deleted = sqlx::query(
        "DELETE FROM writer_portfolios WHERE writer_id = ANY($1)",
    )
    .bind(&user_ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let assignments_deleted = sqlx::query(
        "DELETE FROM assignments WHERE writer_id = ANY($1) OR client_id = ANY($1)",
    )
    .bind(&user_ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let requests_deleted = sqlx::query(
        "DELETE FROM assignment_requests WHERE client_id = ANY($1) OR id = ANY($2)",
    )
    .bind(&user_ids)
    .bind(&orphaned_request_ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let deleted_emails: Vec<String> =
        sqlx::query_scalar("DELETE FROM users WHERE id = ANY($1) RETURNING email")
            .bind(&user_ids)
            .fetch_all(&mut *tx)
            .await?;

    tx.commit().await?;

    let report = SweepReport {
        cutoff,
        users_deleted: deleted_emails.len() as u64,
        deleted_emails,
        ratings_deleted,
        portfolios_deleted,
        assignments_deleted,
        requests_deleted,
    };

    tracing::info!(
        users_deleted = report.users_deleted,
        ratings_deleted = report.ratings_deleted,
        portfolios_deleted = report.portfolios_deleted,
        assignments_deleted = report.assignments_deleted,
        requests_deleted = report.requests_deleted,
        "Retention sweep committed"
    );

    Ok(SweepOutcome::Completed(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_cutoff() {
        let now = Utc::now();
        let cutoff = compute_cutoff(now, DEFAULT_RETENTION_DAYS);
        assert_eq!(now - cutoff, Duration::days(183));
    }

    #[test]
    fn test_compute_cutoff_is_strictly_before_now() {
        let now = Utc::now();
        assert!(compute_cutoff(now, 1) < now);
    }

    #[test]
    fn test_empty_report_shape() {
        let report = SweepReport::empty(Utc::now());
        assert_eq!(report.users_deleted, 0);
        assert!(report.deleted_emails.is_empty());
        assert_eq!(report.ratings_deleted, 0);
    }

    #[test]
    fn test_report_serializes() {
        let report = SweepReport::empty(Utc::now());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("users_deleted"));
        assert!(json.contains("cutoff"));
    }

    // Cascade completeness against a live database is covered in
    // tests/retention_tests.rs.
}
