//! Application state and router builder.
//!
//! # Router layout
//!
//! ```text
//! /
//! ├── /health                          # health check (public)
//! ├── /auth/
//! │   ├── GET /google                  # redirect to Google (public)
//! │   ├── GET /google/callback         # OAuth callback (public)
//! │   ├── GET /logout
//! │   └── GET /status
//! └── /v1/                             # session-authenticated API
//!     ├── GET  /writers                # writer directory
//!     ├── GET  /writers/:id
//!     ├── POST /requests               # post a request
//!     ├── GET  /requests               # browse open requests
//!     ├── POST /requests/:id/accept    # claim a request
//!     ├── GET  /assignments            # my assignments
//!     ├── PUT  /assignments/:id/complete
//!     ├── POST /ratings                # rate a counterparty
//!     ├── GET  /ratings/mine
//!     ├── GET  /profile
//!     ├── PUT  /profile/writer
//!     ├── POST /profile/portfolio
//!     ├── PUT  /profile/whatsapp
//!     └── POST /admin/retention-sweep  # manual sweep trigger
//! ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use writify_shared::auth::{middleware::authenticate, oauth::GoogleOAuth};

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor. Store access is
/// explicit: a procedure only touches the database through the pool it is
/// handed.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Google OAuth client
    pub oauth: Arc<GoogleOAuth>,
}

impl AppState {
    /// Creates application state from a pool and configuration
    pub fn new(db: PgPool, config: Config) -> Self {
        let oauth = GoogleOAuth::new(
            config.oauth.client_id.clone(),
            config.oauth.client_secret.clone(),
            config.oauth.redirect_url.clone(),
        );

        Self {
            db,
            config: Arc::new(config),
            oauth: Arc::new(oauth),
        }
    }

    /// Session-token signing secret
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth flow is public by construction: it is how a session is obtained.
    let auth_routes = Router::new()
        .route("/google", get(routes::auth::google_login))
        .route("/google/callback", get(routes::auth::google_callback))
        .route("/logout", get(routes::auth::logout))
        .route("/status", get(routes::auth::auth_status));

    let v1_routes = Router::new()
        .route("/writers", get(routes::writers::list_writers))
        .route("/writers/:id", get(routes::writers::get_writer))
        .route(
            "/requests",
            post(routes::requests::create_request).get(routes::requests::list_open_requests),
        )
        .route("/requests/:id/accept", post(routes::requests::accept_request))
        .route("/assignments", get(routes::assignments::my_assignments))
        .route(
            "/assignments/:id/complete",
            put(routes::assignments::complete_assignment),
        )
        .route("/ratings", post(routes::ratings::submit_rating))
        .route("/ratings/mine", get(routes::ratings::my_ratings))
        .route("/profile", get(routes::profile::get_profile))
        .route("/profile/writer", put(routes::profile::update_writer_profile))
        .route("/profile/portfolio", post(routes::profile::upsert_portfolio))
        .route("/profile/whatsapp", put(routes::profile::update_whatsapp))
        .route("/admin/retention-sweep", post(routes::admin::trigger_sweep))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let cors = build_cors(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS policy: permissive in development (`*` origin), explicit origins
/// with credentials in production
fn build_cors(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication middleware
///
/// Validates the session cookie (or bearer token) and injects
/// `AuthContext` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = authenticate(req.headers(), state.session_secret())
        .map_err(|e| match e {
            writify_shared::auth::middleware::AuthError::MissingCredentials => {
                ApiError::Unauthorized("Not authenticated".to_string())
            }
            writify_shared::auth::middleware::AuthError::InvalidSession(msg) => {
                ApiError::Unauthorized(msg)
            }
        })?;

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
