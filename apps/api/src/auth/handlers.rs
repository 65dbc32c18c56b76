use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::{Identity, Session};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    let session = state.sessions.sign_in(req.email.trim(), &req.password).await?;
    Ok(Json(session))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.sessions.sign_out(&user.access_token).await?;
    tracing::info!("User {} signed out", user.identity.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(user: CurrentUser) -> Json<Identity> {
    Json(user.identity)
}
