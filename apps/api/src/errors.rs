use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::dashboard::export::ExportError;
use crate::decisions::form::FormError;
use crate::store::StoreError;

/// Where clients send a caller whose session is missing or expired.
pub const LOGIN_ROUTE: &str = "/api/v1/auth/login";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Remote failures keep their message: the caller sees exactly what the
/// backend reported.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Removal must be confirmed")]
    ConfirmationRequired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Form(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::ConfirmationRequired => (
                StatusCode::BAD_REQUEST,
                "CONFIRMATION_REQUIRED",
                "Confirme a remoção antes de continuar".to_string(),
            ),
            AppError::Unauthorized => {
                let body = Json(json!({
                    "error": {
                        "code": "UNAUTHORIZED",
                        "message": "Authentication required",
                        "login_url": LOGIN_ROUTE
                    }
                }));
                return (StatusCode::UNAUTHORIZED, body).into_response();
            }
            AppError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Decision {id} not found"),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string())
            }
            AppError::Auth(AuthError::Rejected { status, message })
                if matches!(*status, 400 | 401 | 422) =>
            {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message.clone())
            }
            AppError::Auth(e) => {
                tracing::error!("Auth service error: {e}");
                (StatusCode::BAD_GATEWAY, "AUTH_ERROR", e.to_string())
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR", e.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
