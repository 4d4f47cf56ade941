//! Error handling for the API server.
//!
//! Handlers return `ApiResult<T>`; every failure converts to a JSON body
//! of the shape `{ "error": <machine code>, "message": <human text> }`
//! with the matching status code. The split the frontend cares about is
//! 4xx ("fix your input" / "you lost a race") versus 5xx ("try again
//! later"); internal details are logged server-side and never leaked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use writify_shared::auth::session::SessionError;
use writify_shared::lifecycle::LifecycleError;
use writify_shared::retention::SweepError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found (404); also covers lost accept races
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity (422): per-field validation failures
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Service unavailable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// One field that failed validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed
    pub field: String,

    /// Why it failed
    pub message: String,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-checkable error code
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// Per-field details for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<Vec<ValidationErrorDetail>>) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(details),
            ),
            ApiError::InternalError(msg) => {
                // Log the specifics, answer with a generic message.
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.constraint().is_some() {
                    return ApiError::Conflict("Conflicting record already exists".to_string());
                }
                ApiError::InternalError(format!("Database error: {db_err}"))
            }
            _ => ApiError::InternalError(format!("Database error: {err}")),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            // The conditional-update guard reports both "no such request"
            // and "someone else won" the same way.
            LifecycleError::RequestNotOpen(_) => {
                ApiError::NotFound("Request not found or already assigned".to_string())
            }
            LifecycleError::AssignmentNotFound(_) => {
                ApiError::NotFound("Assignment not found".to_string())
            }
            LifecycleError::NotAssignmentWriter => ApiError::Forbidden(
                "You are not authorized to complete this assignment".to_string(),
            ),
            LifecycleError::ScoreOutOfRange(score) => {
                ApiError::BadRequest(format!("Score {score} is outside the 1-5 range"))
            }
            LifecycleError::Database(e) => e.into(),
        }
    }
}

impl From<SweepError> for ApiError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::Database(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Request not found".to_string());
        assert_eq!(err.to_string(), "Not found: Request not found");
    }

    #[test]
    fn test_lost_accept_race_maps_to_not_found() {
        let err: ApiError = LifecycleError::RequestNotOpen(Uuid::new_v4()).into();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("already assigned")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_completion_maps_to_forbidden() {
        let err: ApiError = LifecycleError::NotAssignmentWriter.into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            error: "not_found".to_string(),
            message: "Request not found".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"error\":\"not_found\""));
        assert!(!json.contains("details"));
    }
}
