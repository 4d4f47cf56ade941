//! Session tokens and cookies.
//!
//! After a successful Google sign-in the API issues a signed session
//! token (HS256) and sets it as an HttpOnly cookie. The token carries
//! only the user id; everything else is loaded from the store per
//! request.
//!
//! # Example
//!
//! ```
//! use writify_shared::auth::session::{issue_token, validate_token, SessionClaims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let user_id = Uuid::new_v4();
//! let secret = "a-test-secret-at-least-32-bytes-long!!";
//!
//! let token = issue_token(&SessionClaims::new(user_id), secret)?;
//! let claims = validate_token(&token, secret)?;
//! assert_eq!(claims.sub, user_id);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "writify_session";

/// Name of the short-lived OAuth CSRF-state cookie
pub const STATE_COOKIE: &str = "writify_oauth_state";

/// Session lifetime: 24 hours
pub const SESSION_TTL_HOURS: i64 = 24;

/// OAuth state cookie lifetime: 10 minutes
const STATE_TTL_SECS: i64 = 600;

/// Token issuer claim
const ISSUER: &str = "writify";

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to sign a token
    #[error("failed to create session token: {0}")]
    Create(String),

    /// Session has expired
    #[error("session expired")]
    Expired,

    /// Token failed signature or claim validation
    #[error("invalid session token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: user ID
    pub sub: Uuid,

    /// Issuer, always "writify"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Creates claims with the default 24-hour lifetime
    pub fn new(user_id: Uuid) -> Self {
        Self::with_ttl(user_id, Duration::hours(SESSION_TTL_HOURS))
    }

    /// Creates claims with a custom lifetime
    pub fn with_ttl(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Signs a session token
pub fn issue_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::Create(e.to_string()))
}

/// Validates a session token's signature, expiry and issuer
pub fn validate_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Builds a `Set-Cookie` value for a fresh session
///
/// Cross-site cookies (production, where frontend and API live on
/// different origins) need `SameSite=None; Secure`; development falls
/// back to `Lax` so plain-http localhost still works.
pub fn session_cookie(token: &str, secure: bool) -> String {
    cookie(SESSION_COOKIE, token, SESSION_TTL_HOURS * 3600, secure)
}

/// Builds a `Set-Cookie` value that clears the session
pub fn clear_session_cookie(secure: bool) -> String {
    cookie(SESSION_COOKIE, "", 0, secure)
}

/// Builds a `Set-Cookie` value carrying the OAuth CSRF state
pub fn state_cookie(state: &str, secure: bool) -> String {
    cookie(STATE_COOKIE, state, STATE_TTL_SECS, secure)
}

/// Builds a `Set-Cookie` value that clears the OAuth state
pub fn clear_state_cookie(secure: bool) -> String {
    cookie(STATE_COOKIE, "", 0, secure)
}

fn cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let same_site = if secure { "None" } else { "Lax" };
    let mut out = format!(
        "{name}={value}; Path=/; HttpOnly; Max-Age={max_age_secs}; SameSite={same_site}"
    );
    if secure {
        out.push_str("; Secure");
    }
    out
}
