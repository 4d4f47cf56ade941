//! Configuration for the API server.
//!
//! Everything comes from environment variables (a `.env` file is honored
//! in development):
//!
//! - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:5000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
//! - `SESSION_SECRET`: session-token signing key, at least 32 bytes
//!   (required)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`: OAuth app credentials
//!   (required)
//! - `OAUTH_REDIRECT_URL`: our callback URL registered with Google
//! - `ALLOWED_EMAIL_DOMAIN`: institutional email suffix sign-ups must
//!   match (default `@student.iul.ac.in`)
//! - `FRONTEND_URL`: where auth redirects land (default
//!   http://localhost:3000)
//! - `CORS_ORIGINS`: comma-separated allowed origins; `*` means
//!   permissive development mode
//! - `PRODUCTION`: `true` enables Secure cookies and HSTS

use serde::{Deserialize, Serialize};
use std::env;
use writify_shared::db::pool::DatabaseConfig;

/// Complete API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server settings
    pub api: ApiConfig,

    /// Database pool settings
    pub database: DatabaseConfig,

    /// Session-token settings
    pub session: SessionConfig,

    /// Google OAuth settings
    pub oauth: OAuthConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` enables permissive mode
    pub cors_origins: Vec<String>,

    /// Frontend base URL for auth redirects
    pub frontend_url: String,

    /// Production mode: Secure cookies, HSTS
    pub production: bool,
}

/// Session-token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signing key for session tokens; at least 32 bytes
    pub secret: String,
}

/// Google OAuth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth application client ID
    pub client_id: String,

    /// OAuth application client secret
    pub client_secret: String,

    /// Callback URL registered with Google
    pub redirect_url: String,

    /// Institutional email suffix sign-ups must match
    pub allowed_email_domain: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (development convenience).
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let production = env::var("PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;
        if secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 characters long");
        }

        let client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("GOOGLE_CLIENT_ID environment variable is required"))?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET").map_err(|_| {
            anyhow::anyhow!("GOOGLE_CLIENT_SECRET environment variable is required")
        })?;
        let redirect_url = env::var("OAUTH_REDIRECT_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/auth/google/callback"));
        let allowed_email_domain = env::var("ALLOWED_EMAIL_DOMAIN")
            .unwrap_or_else(|_| "@student.iul.ac.in".to_string());

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                frontend_url,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            session: SessionConfig { secret },
            oauth: OAuthConfig {
                client_id,
                client_secret,
                redirect_url,
                allowed_email_domain,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
