//! Google sign-in flow and session management.
//!
//! # Endpoints
//!
//! - `GET /auth/google`: redirect the browser to Google's consent page
//! - `GET /auth/google/callback`: finish the flow: verify state,
//!   exchange the code, enforce the institutional email policy, create
//!   the account on first sign-in, set the session cookie
//! - `GET /auth/logout`: clear the session cookie
//! - `GET /auth/status`: report the current session to the frontend
//!
//! The callback never answers with a JSON error: it is a browser
//! navigation, so every failure redirects back to the frontend login page
//! with an `error` query parameter (`unauthorized` for policy failures,
//! `server` for everything else).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use writify_shared::auth::middleware::{authenticate, cookie_value};
use writify_shared::auth::oauth::{generate_state, is_institutional_email};
use writify_shared::auth::session::{
    clear_session_cookie, clear_state_cookie, issue_token, session_cookie, state_cookie,
    SessionClaims, STATE_COOKIE,
};
use writify_shared::models::user::{NewGoogleUser, User};

/// Query parameters Google sends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code (absent when the user denied consent)
    pub code: Option<String>,

    /// CSRF state we sent along
    pub state: Option<String>,

    /// Error indicator from Google
    pub error: Option<String>,
}

/// Session status reported to the frontend
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    /// Whether a valid session was presented
    pub is_authenticated: bool,

    /// The signed-in user, when authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// `GET /auth/google`: start the sign-in flow
pub async fn google_login(State(state): State<AppState>) -> ApiResult<Response> {
    let nonce = generate_state();
    let url = state.oauth.authorize_url(&nonce);

    redirect_with_cookies(
        &url,
        &[state_cookie(&nonce, state.config.api.production)],
    )
}

/// `GET /auth/google/callback`: finish the sign-in flow
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let frontend = state.config.api.frontend_url.clone();
    let production = state.config.api.production;

    let failure = |reason: &str| {
        redirect_with_cookies(
            &format!("{frontend}/login?error={reason}"),
            &[clear_state_cookie(production)],
        )
    };

    let code = match (&query.error, &query.code) {
        (Some(err), _) => {
            tracing::warn!(error = %err, "Google reported an authorization error");
            return failure("unauthorized");
        }
        (None, None) => return failure("unauthorized"),
        (None, Some(code)) => code.clone(),
    };

    // CSRF check: the state we issued must come back unchanged.
    let sent_state = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| cookie_value(cookies, STATE_COOKIE));
    if sent_state.is_none() || sent_state != query.state {
        tracing::warn!("OAuth state mismatch, rejecting callback");
        return failure("unauthorized");
    }

    let access_token = match state.oauth.exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "OAuth code exchange failed");
            return failure("server");
        }
    };

    let profile = match state.oauth.fetch_userinfo(&access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Userinfo fetch failed");
            return failure("server");
        }
    };

    // Only institutional accounts may sign up; no user row is created for
    // anyone else.
    if !is_institutional_email(&profile.email, &state.config.oauth.allowed_email_domain) {
        tracing::info!(email = %profile.email, "Rejected non-institutional sign-in");
        return failure("unauthorized");
    }

    let new_user = NewGoogleUser {
        google_id: profile.sub,
        name: profile.name.unwrap_or_else(|| profile.email.clone()),
        email: profile.email,
        profile_picture: profile.picture,
    };

    let (user, created) = match User::find_or_create(&state.db, &new_user).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "User lookup/creation failed");
            return failure("server");
        }
    };

    if created {
        tracing::info!(user_id = %user.id, "Created account on first sign-in");
    }

    let token = issue_token(&SessionClaims::new(user.id), state.session_secret())?;

    redirect_with_cookies(
        &format!("{frontend}/dashboard"),
        &[
            session_cookie(&token, production),
            clear_state_cookie(production),
        ],
    )
}

/// `GET /auth/logout`: clear the session and return to the login page
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let frontend = &state.config.api.frontend_url;

    redirect_with_cookies(
        &format!("{frontend}/login"),
        &[clear_session_cookie(state.config.api.production)],
    )
}

/// `GET /auth/status`: report the current session
///
/// Always 200; the body says whether the caller is signed in. A session
/// whose user row has since been purged by the retention sweep counts as
/// signed out.
pub async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AuthStatus>> {
    let ctx = match authenticate(&headers, state.session_secret()) {
        Ok(ctx) => ctx,
        Err(_) => {
            return Ok(Json(AuthStatus {
                is_authenticated: false,
                user: None,
            }))
        }
    };

    let user = User::find_by_id(&state.db, ctx.user_id).await?;

    Ok(Json(AuthStatus {
        is_authenticated: user.is_some(),
        user,
    }))
}

/// Builds a redirect carrying one or more `Set-Cookie` headers
fn redirect_with_cookies(url: &str, cookies: &[String]) -> ApiResult<Response> {
    let mut response = Redirect::to(url).into_response();

    for cookie in cookies {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| ApiError::InternalError(format!("invalid cookie header: {e}")))?;
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(response)
}
