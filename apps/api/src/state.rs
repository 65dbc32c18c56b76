use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record store for the `decisoes` table. Postgres in production, in-memory
    /// for tests and `RECORD_STORE=memory`.
    pub store: Arc<dyn RecordStore>,
    /// Hosted auth service; resolves bearer tokens for the `CurrentUser` extractor.
    pub sessions: Arc<dyn SessionProvider>,
}
