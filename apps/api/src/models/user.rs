use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user behind a request, as reported by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens handed out by a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: Identity,
}
