//! Session Provider: identity lookup, sign-in and sign-out against the hosted
//! auth service.
//!
//! Handlers receive the caller's identity explicitly through the `CurrentUser`
//! extractor; there is no process-wide "current user".

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use thiserror::Error;

use crate::errors::AppError;
use crate::models::user::{Identity, Session};
use crate::state::AppState;

pub mod gotrue;
pub mod handlers;

pub use gotrue::GoTrueSessionProvider;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Resolves an access token. `None` when the token is unknown or expired.
    async fn identity(&self, access_token: &str) -> Result<Option<Identity>, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: Identity,
    pub access_token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let identity = state
            .sessions
            .identity(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser {
            identity,
            access_token: token,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
