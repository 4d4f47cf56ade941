//! Shared fixtures for the database-backed integration tests.
//!
//! These suites need a live PostgreSQL; point `DATABASE_URL` at a scratch
//! database and run them with `cargo test -- --ignored`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use writify_shared::models::user::User;
use writify_shared::retention::{run_sweep_at, SweepOutcome, SweepReport};

/// Connects to the test database and brings the schema up to date
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a scratch database for integration tests");

    let pool = PgPool::connect(&url).await.expect("connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

/// Inserts a user directly, bypassing the OAuth path
///
/// Each call gets a unique google_id/email so tests can run against a
/// shared database.
pub async fn create_user(pool: &PgPool, role: &str, whatsapp: Option<&str>) -> User {
    create_user_created_at(pool, role, whatsapp, Utc::now()).await
}

/// Inserts a user with an explicit creation time (for retention tests)
pub async fn create_user_created_at(
    pool: &PgPool,
    role: &str,
    whatsapp: Option<&str>,
    created_at: DateTime<Utc>,
) -> User {
    let tag = Uuid::new_v4();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (google_id, email, name, role, whatsapp_number, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, google_id, email, name, profile_picture, role,
                  university_stream, whatsapp_number, writer_status,
                  rating, total_ratings, created_at
        "#,
    )
    .bind(format!("google-{tag}"))
    .bind(format!("test-{tag}@student.iul.ac.in"))
    .bind("Test User")
    .bind(role)
    .bind(whatsapp)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("insert test user")
}

/// Runs the sweep, retrying while another test holds the sweep lock
pub async fn sweep_until_completed(pool: &PgPool, cutoff: DateTime<Utc>) -> SweepReport {
    loop {
        match run_sweep_at(pool, cutoff).await.expect("sweep") {
            SweepOutcome::Completed(report) => return report,
            SweepOutcome::AlreadyRunning => {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

/// Counts rows in `table` where `column` equals the given user id
pub async fn count_refs(pool: &PgPool, table: &str, column: &str, id: Uuid) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("count query");
    count
}
