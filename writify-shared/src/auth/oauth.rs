//! Google OAuth authorization-code flow.
//!
//! We consume Google's endpoints; nothing of the protocol itself is
//! reimplemented here. The flow is the standard three steps: redirect the
//! browser to the authorization endpoint with a CSRF state nonce,
//! exchange the returned code for an access token, fetch the userinfo
//! document.
//!
//! Sign-ups are restricted to the institutional email domain; a profile
//! failing [`is_institutional_email`] is rejected before any user row is
//! created.

use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use thiserror::Error;

/// Google's OAuth 2.0 authorization endpoint
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's token exchange endpoint
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Google's OpenID userinfo endpoint
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Length of the CSRF state nonce
const STATE_LEN: usize = 32;

/// Error type for the OAuth flow
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Transport-level failure talking to Google
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint refused the code
    #[error("token exchange failed with status {status}")]
    TokenExchange { status: u16 },

    /// Userinfo endpoint refused the access token
    #[error("userinfo fetch failed with status {status}")]
    Userinfo { status: u16 },
}

/// The profile Google reports for a signed-in account
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable, opaque subject identifier
    pub sub: String,

    /// Verified email address
    pub email: String,

    /// Display name (absent for some accounts)
    pub name: Option<String>,

    /// Avatar URL
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the Google authorization-code flow
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    http: reqwest::Client,
}

impl GoogleOAuth {
    /// Creates a client from the registered application credentials
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            http: reqwest::Client::new(),
        }
    }

    /// Builds the authorization URL the browser is redirected to
    ///
    /// `state` must be remembered (we keep it in a short-lived cookie) and
    /// compared on the callback.
    pub fn authorize_url(&self, state: &str) -> String {
        // Infallible: the endpoint is a known-good constant URL.
        let url = reqwest::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .expect("authorization endpoint URL is valid");

        url.to_string()
    }

    /// Exchanges an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenExchange {
                status: response.status().as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetches the signed-in account's profile
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Userinfo {
                status: response.status().as_u16(),
            });
        }

        let profile: GoogleProfile = response.json().await?;
        Ok(profile)
    }
}

/// Generates a random CSRF state nonce
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Checks an email against the institutional domain suffix
///
/// Comparison is case-insensitive; Google reports emails lowercased but
/// the configured suffix may not be.
pub fn is_institutional_email(email: &str, domain_suffix: &str) -> bool {
    email
        .to_ascii_lowercase()
        .ends_with(&domain_suffix.to_ascii_lowercase())
}
