//! Client for the hosted auth REST API (`/auth/v1`).
//!
//! Every call carries the project's anon key in the `apikey` header; user calls
//! additionally carry the user's access token as a bearer token. No retries: a
//! failed call surfaces once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, SessionProvider};
use crate::models::user::{Identity, Session};

#[derive(Clone)]
pub struct GoTrueSessionProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    email: Option<String>,
}

impl From<UserBody> for Identity {
    fn from(user: UserBody) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: UserBody,
}

/// The auth service reports errors under several different keys depending on
/// the endpoint.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| body.to_string())
}

impl GoTrueSessionProvider {
    pub fn new(base_url: &str, anon_key: String, timeout: Duration) -> Result<Self, AuthError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn rejected(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AuthError::Rejected {
            status,
            message: error_message(&body),
        }
    }
}

#[async_trait]
impl SessionProvider for GoTrueSessionProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Sign-in rejected by auth service ({})", response.status());
            return Err(Self::rejected(response).await);
        }

        let token: TokenBody = response.json().await?;
        info!("User {} signed in", token.user.id);
        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user.into(),
        })
    }

    async fn identity(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected by auth service");
                Ok(None)
            }
            status if status.is_success() => {
                let user: UserBody = response.json().await?;
                Ok(Some(user.into()))
            }
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        // An already-revoked token is as signed out as it gets.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(Self::rejected(response).await)
    }
}
