mod auth;
mod config;
mod dashboard;
mod db;
mod decisions;
mod errors;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{GoTrueSessionProvider, SessionProvider};
use crate::config::{Config, StoreBackend};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgRecordStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Decisoes API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    let sessions: Arc<dyn SessionProvider> = Arc::new(
        GoTrueSessionProvider::new(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            Duration::from_secs(config.auth_timeout_secs),
        )
        .context("failed to build auth client")?,
    );
    info!("Auth client initialized ({})", config.supabase_url);

    let state = AppState { store, sessions };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres record store")?;
            let pool = create_pool(url, config.db_max_connections).await?;
            Ok(Arc::new(PgRecordStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory record store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
