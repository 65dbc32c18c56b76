//! Record Store: every read and write against the `decisoes` table.
//!
//! `AppState` carries an `Arc<dyn RecordStore>`; handlers never touch the pool
//! directly. Each operation is a single round-trip with no retry.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::dashboard::filter::FilterCriteria;
use crate::models::decision::{DecisionPatch, DecisionRecord, LabelError, NewDecision};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("Decision {0} not found")]
    NotFound(i64),

    #[error("Stored row is invalid: {0}")]
    Corrupt(#[from] LabelError),
}

/// Ordering by `data_decisao`. Query strings spell it `asc` / `desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DateOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl DateOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            DateOrder::Ascending => "ASC",
            DateOrder::Descending => "DESC",
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_all(&self, order: DateOrder) -> Result<Vec<DecisionRecord>, StoreError>;

    /// Case-insensitive substring match on `nome`, newest decisions first.
    async fn search_by_name(&self, pattern: &str) -> Result<Vec<DecisionRecord>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<DecisionRecord>, StoreError>;

    async fn insert(&self, decision: NewDecision) -> Result<DecisionRecord, StoreError>;

    async fn update_fields(&self, id: i64, patch: &DecisionPatch) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;

    async fn filtered_query(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<DecisionRecord>, StoreError>;
}
