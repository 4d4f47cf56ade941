//! Writer portfolio model.
//!
//! At most one portfolio per writer: a sample-work reference plus a
//! description, upserted whole on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A writer's sample work
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WriterPortfolio {
    /// Unique portfolio ID
    pub id: Uuid,

    /// Owning writer (unique)
    pub writer_id: Uuid,

    /// Link to an uploaded sample
    pub sample_work_image: Option<String>,

    /// Free-text description of the writer's work
    pub description: Option<String>,

    /// Last save time
    pub updated_at: DateTime<Utc>,
}

/// Portfolio fields a writer submits
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPortfolio {
    /// Link to an uploaded sample
    pub sample_work_image: Option<String>,

    /// Free-text description
    pub description: Option<String>,
}

impl WriterPortfolio {
    /// Creates or replaces the writer's portfolio
    ///
    /// Keyed by `writer_id`; a second save overwrites both fields.
    pub async fn upsert(
        pool: &PgPool,
        writer_id: Uuid,
        data: UpsertPortfolio,
    ) -> Result<Self, sqlx::Error> {
        let portfolio = sqlx::query_as::<_, WriterPortfolio>(
            r#"
            INSERT INTO writer_portfolios (writer_id, sample_work_image, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (writer_id)
            DO UPDATE SET sample_work_image = EXCLUDED.sample_work_image,
                          description = EXCLUDED.description,
                          updated_at = NOW()
            RETURNING id, writer_id, sample_work_image, description, updated_at
            "#,
        )
        .bind(writer_id)
        .bind(data.sample_work_image)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(portfolio)
    }

    /// Finds a writer's portfolio, if they have one
    pub async fn find_by_writer(
        pool: &PgPool,
        writer_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let portfolio = sqlx::query_as::<_, WriterPortfolio>(
            r#"
            SELECT id, writer_id, sample_work_image, description, updated_at
            FROM writer_portfolios
            WHERE writer_id = $1
            "#,
        )
        .bind(writer_id)
        .fetch_optional(pool)
        .await?;

        Ok(portfolio)
    }
}
