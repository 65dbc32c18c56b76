use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which `RecordStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("RECORD_STORE must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is Postgres.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub auth_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackend = optional_env("RECORD_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            store_backend,
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            auth_timeout_secs: parse_env("AUTH_TIMEOUT_SECS", 15)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => parse_value(key, &raw),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
