//! Session extraction for API requests.
//!
//! The API layer wraps protected routes in a middleware that calls
//! [`authenticate`] and injects the resulting [`AuthContext`] into
//! request extensions. Handlers read it back with Axum's `Extension`
//! extractor.
//!
//! Credentials are looked for in two places, in order:
//! 1. `Authorization: Bearer <token>` (programmatic clients)
//! 2. the `writify_session` cookie (the browser frontend)

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::session::{validate_token, SessionError, SESSION_COOKIE};

/// Authentication context added to request extensions after a valid
/// session is presented
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Error type for session extraction
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token and no session cookie
    MissingCredentials,

    /// The presented token failed validation
    InvalidSession(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Not authenticated".to_string(),
            AuthError::InvalidSession(msg) => msg,
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "message": message })),
        )
            .into_response()
    }
}

/// Validates the request's session and returns its context
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = session_token_from_headers(headers).ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(&token, secret).map_err(|e| match e {
        SessionError::Expired => AuthError::InvalidSession("Session expired".to_string()),
        other => AuthError::InvalidSession(other.to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}

/// Pulls the session token out of the request headers, if present
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| cookie_value(cookies, SESSION_COOKIE))
}

/// Finds a named cookie in a `Cookie` header value
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}
