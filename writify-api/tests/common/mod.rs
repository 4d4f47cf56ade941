//! Shared infrastructure for API integration tests.
//!
//! Two flavors of context:
//!
//! - [`TestContext::lazy`] builds the full router over a pool that never
//!   connects. Good for everything that fails before touching the store
//!   (auth rejection, redirects, validation).
//! - [`TestContext::connected`] needs a live PostgreSQL via
//!   `DATABASE_URL`; tests using it are `#[ignore]`d by default.

use axum::body::Body;
use axum::http::{Request, Response};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tower::Service as _;
use uuid::Uuid;
use writify_api::app::{build_router, AppState};
use writify_api::config::{ApiConfig, Config, OAuthConfig, SessionConfig};
use writify_shared::auth::session::{issue_token, SessionClaims};
use writify_shared::db::pool::DatabaseConfig;
use writify_shared::models::user::User;

/// Session signing secret used across the test suite
pub const TEST_SECRET: &str = "integration-test-secret-32-bytes!!!!";

/// Test context bundling the app and its resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Context over a pool that never connects (no database required)
    pub fn lazy() -> Self {
        let db = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy("postgres://localhost:59999/writify_unreachable")
            .expect("lazy pool");

        Self::with_pool(db)
    }

    /// Context over a live database; runs migrations first
    pub async fn connected() -> Self {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a scratch database for integration tests");

        let db = PgPool::connect(&url).await.expect("connect to test database");

        sqlx::migrate!("../writify-shared/migrations")
            .run(&db)
            .await
            .expect("run migrations");

        Self::with_pool(db)
    }

    fn with_pool(db: PgPool) -> Self {
        let state = AppState::new(db.clone(), test_config());
        let app = build_router(state);
        Self { db, app }
    }

    /// Sends one request through the router
    pub async fn call(&mut self, request: Request<Body>) -> Response<axum::body::Body> {
        self.app.call(request).await.expect("router call")
    }

    /// Bearer header value for an existing user
    pub fn auth_header(&self, user_id: Uuid) -> String {
        let token = issue_token(&SessionClaims::new(user_id), TEST_SECRET).expect("issue token");
        format!("Bearer {token}")
    }

    /// Inserts a user directly, bypassing the OAuth flow
    pub async fn create_user(&self, whatsapp: Option<&str>) -> User {
        let tag = Uuid::new_v4();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (google_id, email, name, whatsapp_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, google_id, email, name, profile_picture, role,
                      university_stream, whatsapp_number, writer_status,
                      rating, total_ratings, created_at
            "#,
        )
        .bind(format!("google-{tag}"))
        .bind(format!("test-{tag}@student.iul.ac.in"))
        .bind("Test User")
        .bind(whatsapp)
        .fetch_one(&self.db)
        .await
        .expect("insert test user")
    }
}

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            frontend_url: "http://localhost:3000".to_string(),
            production: false,
        },
        database: DatabaseConfig::default(),
        session: SessionConfig {
            secret: TEST_SECRET.to_string(),
        },
        oauth: OAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_url: "http://localhost:5000/auth/google/callback".to_string(),
            allowed_email_domain: "@student.iul.ac.in".to_string(),
        },
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body as JSON")
}
