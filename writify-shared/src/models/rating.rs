//! Rating model.
//!
//! A rating is one mutable judgment per (rater, request) pair, not an
//! append-only log: resubmitting replaces the previous score and comment
//! in place. The upsert itself and the aggregate recomputation run inside
//! the `submit_rating` transaction in [`crate::lifecycle`].
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE ratings (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     rater_id UUID NOT NULL REFERENCES users(id),
//!     rated_id UUID NOT NULL REFERENCES users(id),
//!     assignment_request_id UUID NOT NULL REFERENCES assignment_requests(id),
//!     score SMALLINT NOT NULL CHECK (score BETWEEN 1 AND 5),
//!     comment TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (rater_id, assignment_request_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// One party's judgment of the other for a specific request
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    /// Unique rating ID
    pub id: Uuid,

    /// User who submitted the rating
    pub rater_id: Uuid,

    /// User being rated
    pub rated_id: Uuid,

    /// Request the rating refers to
    pub assignment_request_id: Uuid,

    /// Score, 1 through 5
    pub score: i16,

    /// Optional free-text comment
    pub comment: Option<String>,

    /// When the rating was (last) submitted
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Finds the rating a user submitted for a request, if any
    pub async fn find_by_rater_and_request(
        pool: &PgPool,
        rater_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, rater_id, rated_id, assignment_request_id,
                   score, comment, created_at
            FROM ratings
            WHERE rater_id = $1 AND assignment_request_id = $2
            "#,
        )
        .bind(rater_id)
        .bind(request_id)
        .fetch_optional(pool)
        .await?;

        Ok(rating)
    }

    /// Maps request id → rated user id for everything this user has rated
    ///
    /// Used by the "my assignments" view to flag which counterparties the
    /// caller has already judged.
    pub async fn rated_by(
        pool: &PgPool,
        rater_id: Uuid,
    ) -> Result<HashMap<Uuid, Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT assignment_request_id, rated_id
            FROM ratings
            WHERE rater_id = $1
            "#,
        )
        .bind(rater_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Lists the ratings a user has received, newest first
    pub async fn list_for_rated(pool: &PgPool, rated_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, rater_id, rated_id, assignment_request_id,
                   score, comment, created_at
            FROM ratings
            WHERE rated_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(rated_id)
        .fetch_all(pool)
        .await?;

        Ok(ratings)
    }

    /// Counts all ratings received by a user
    pub async fn count_for_rated(pool: &PgPool, rated_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ratings WHERE rated_id = $1")
                .bind(rated_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
