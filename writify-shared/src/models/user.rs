//! User model and database operations.
//!
//! A user is one entity for both sides of the marketplace: the same
//! account posts requests ("client") and accepts them ("writer").
//! Accounts are created on first successful Google sign-in and destroyed
//! only by the retention sweep.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     google_id VARCHAR(255) NOT NULL UNIQUE,
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     name VARCHAR(255) NOT NULL,
//!     profile_picture VARCHAR(512),
//!     role VARCHAR(50) NOT NULL DEFAULT 'student',
//!     university_stream VARCHAR(255),
//!     whatsapp_number VARCHAR(32),
//!     writer_status writer_status NOT NULL DEFAULT 'inactive',
//!     rating DOUBLE PRECISION NOT NULL DEFAULT 0,
//!     total_ratings INTEGER NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `rating` and `total_ratings` are aggregates over the ratings table.
//! They are only ever written by the recomputation inside
//! [`crate::lifecycle::submit_rating`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role assigned to every account at creation.
///
/// The retention sweep only purges accounts still carrying this role;
/// anything promoted past it is exempt.
pub const DEFAULT_ROLE: &str = "student";

/// Writer availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "writer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WriterStatus {
    /// Not currently offering to write
    Inactive,

    /// Open to accepting requests
    Active,

    /// Working on an accepted assignment
    Busy,
}

impl WriterStatus {
    /// Converts status to its database/string form
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterStatus::Inactive => "inactive",
            WriterStatus::Active => "active",
            WriterStatus::Busy => "busy",
        }
    }

    /// Parses a status from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(WriterStatus::Inactive),
            "active" => Some(WriterStatus::Active),
            "busy" => Some(WriterStatus::Busy),
            _ => None,
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Opaque identity-provider subject
    pub google_id: String,

    /// Institutional email address
    pub email: String,

    /// Display name from the identity provider
    pub name: String,

    /// Optional avatar URL
    pub profile_picture: Option<String>,

    /// Account role; `student` unless promoted out-of-band
    pub role: String,

    /// Free-form course of study shown on the writer profile
    pub university_stream: Option<String>,

    /// Contact number exchanged after a successful accept
    pub whatsapp_number: Option<String>,

    /// Writer availability
    pub writer_status: WriterStatus,

    /// Average of all ratings where this user is the rated party
    pub rating: f64,

    /// Number of ratings backing the average
    pub total_ratings: i32,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Profile data supplied by the identity provider on sign-in
#[derive(Debug, Clone)]
pub struct NewGoogleUser {
    /// Provider subject (stable, opaque)
    pub google_id: String,

    /// Verified email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Avatar URL, if the profile has one
    pub profile_picture: Option<String>,
}

/// Writer-profile fields a user may update about themselves
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWriterProfile {
    /// Course of study
    pub university_stream: Option<String>,

    /// Contact number
    pub whatsapp_number: Option<String>,

    /// Availability
    pub writer_status: Option<WriterStatus>,
}

/// A user as shown in the writer directory: profile fields plus the
/// portfolio sample, minus contact details
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WriterListing {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub university_stream: Option<String>,
    pub writer_status: WriterStatus,
    pub rating: f64,
    pub total_ratings: i32,
    pub sample_work_image: Option<String>,
}

impl User {
    /// Finds the account for an identity-provider subject, creating it on
    /// first sign-in
    ///
    /// Returns the user and whether a new row was inserted. Email-domain
    /// policy is enforced by the caller before this point; this function
    /// never rejects a profile.
    pub async fn find_or_create(
        pool: &PgPool,
        profile: &NewGoogleUser,
    ) -> Result<(Self, bool), sqlx::Error> {
        if let Some(user) = Self::find_by_google_id(pool, &profile.google_id).await? {
            return Ok((user, false));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (google_id, email, name, profile_picture)
            VALUES ($1, $2, $3, $4)
            RETURNING id, google_id, email, name, profile_picture, role,
                      university_stream, whatsapp_number, writer_status,
                      rating, total_ratings, created_at
            "#,
        )
        .bind(&profile.google_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.profile_picture)
        .fetch_one(pool)
        .await?;

        Ok((user, true))
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, google_id, email, name, profile_picture, role,
                   university_stream, whatsapp_number, writer_status,
                   rating, total_ratings, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by identity-provider subject
    pub async fn find_by_google_id(
        pool: &PgPool,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, google_id, email, name, profile_picture, role,
                   university_stream, whatsapp_number, writer_status,
                   rating, total_ratings, created_at
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the caller's writer profile
    ///
    /// Returns the updated user, or `None` if the account no longer
    /// exists.
    pub async fn update_writer_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateWriterProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET university_stream = COALESCE($2, university_stream),
                whatsapp_number = COALESCE($3, whatsapp_number),
                writer_status = COALESCE($4, writer_status)
            WHERE id = $1
            RETURNING id, google_id, email, name, profile_picture, role,
                      university_stream, whatsapp_number, writer_status,
                      rating, total_ratings, created_at
            "#,
        )
        .bind(id)
        .bind(data.university_stream)
        .bind(data.whatsapp_number)
        .bind(data.writer_status)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the user's contact number
    ///
    /// Returns true when the row existed.
    pub async fn update_whatsapp_number(
        pool: &PgPool,
        id: Uuid,
        number: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET whatsapp_number = $2 WHERE id = $1")
            .bind(id)
            .bind(number)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetches just the contact number for a user
    pub async fn whatsapp_number(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<String>, sqlx::Error> {
        let number: Option<Option<String>> =
            sqlx::query_scalar("SELECT whatsapp_number FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(number.flatten())
    }

    /// Lists the writer directory, best-rated first, with the portfolio
    /// sample joined in
    ///
    /// Contact numbers are deliberately absent here; they are only handed
    /// over when a request is accepted.
    pub async fn list_writers(pool: &PgPool) -> Result<Vec<WriterListing>, sqlx::Error> {
        let writers = sqlx::query_as::<_, WriterListing>(
            r#"
            SELECT u.id, u.name, u.email, u.profile_picture, u.university_stream,
                   u.writer_status, u.rating, u.total_ratings,
                   wp.sample_work_image
            FROM users u
            LEFT JOIN writer_portfolios wp ON wp.writer_id = u.id
            ORDER BY u.rating DESC, u.total_ratings DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(writers)
    }

    /// Fetches one writer-directory entry
    pub async fn find_writer(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<WriterListing>, sqlx::Error> {
        let writer = sqlx::query_as::<_, WriterListing>(
            r#"
            SELECT u.id, u.name, u.email, u.profile_picture, u.university_stream,
                   u.writer_status, u.rating, u.total_ratings,
                   wp.sample_work_image
            FROM users u
            LEFT JOIN writer_portfolios wp ON wp.writer_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(writer)
    }
}
