//! Own-profile endpoints.
//!
//! - `GET /v1/profile`: the signed-in user, portfolio embedded when one
//!   exists
//! - `PUT /v1/profile/writer`: update stream / contact number /
//!   availability
//! - `POST /v1/profile/portfolio`: create or replace the portfolio
//! - `PUT /v1/profile/whatsapp`: update just the contact number

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use writify_shared::auth::middleware::AuthContext;
use writify_shared::models::portfolio::{UpsertPortfolio, WriterPortfolio};
use writify_shared::models::user::{UpdateWriterProfile, User};

/// Profile response: the user plus their portfolio, if any
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<PortfolioInfo>,
}

/// Embedded portfolio fields
#[derive(Debug, Serialize)]
pub struct PortfolioInfo {
    pub sample_work_image: Option<String>,
    pub description: Option<String>,
}

/// Payload for updating the contact number
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWhatsappPayload {
    /// New contact number
    #[validate(length(min = 1, message = "WhatsApp number is required"))]
    pub whatsapp_number: String,
}

/// Simple confirmation body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /v1/profile`
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let portfolio = WriterPortfolio::find_by_writer(&state.db, user.id)
        .await?
        .map(|p| PortfolioInfo {
            sample_work_image: p.sample_work_image,
            description: p.description,
        });

    Ok(Json(ProfileResponse { user, portfolio }))
}

/// `PUT /v1/profile/writer`
pub async fn update_writer_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateWriterProfile>,
) -> ApiResult<Json<User>> {
    let user = User::update_writer_profile(&state.db, auth.user_id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// `POST /v1/profile/portfolio`
pub async fn upsert_portfolio(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpsertPortfolio>,
) -> ApiResult<Json<WriterPortfolio>> {
    let portfolio = WriterPortfolio::upsert(&state.db, auth.user_id, payload).await?;
    Ok(Json(portfolio))
}

/// `PUT /v1/profile/whatsapp`
pub async fn update_whatsapp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateWhatsappPayload>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;

    let updated =
        User::update_whatsapp_number(&state.db, auth.user_id, &payload.whatsapp_number).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "WhatsApp number updated successfully".to_string(),
    }))
}
