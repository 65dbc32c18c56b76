use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::dashboard::filter::{contains_ignore_case, FilterCriteria};
use crate::models::decision::{DecisionPatch, DecisionRecord, NewDecision};
use crate::store::{DateOrder, RecordStore, StoreError};

#[derive(Default)]
struct Table {
    rows: Vec<DecisionRecord>,
    next_id: i64,
}

/// Process-local table used by tests and by `RECORD_STORE=memory`.
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_records(rows: Vec<DecisionRecord>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            table: RwLock::new(Table { rows, next_id }),
        }
    }

    async fn sorted(&self, order: DateOrder) -> Vec<DecisionRecord> {
        let mut rows = self.table.read().await.rows.clone();
        match order {
            DateOrder::Ascending => rows.sort_by_key(|r| r.data_decisao),
            DateOrder::Descending => rows.sort_by_key(|r| Reverse(r.data_decisao)),
        }
        rows
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_all(&self, order: DateOrder) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(self.sorted(order).await)
    }

    async fn search_by_name(&self, pattern: &str) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(self
            .sorted(DateOrder::Descending)
            .await
            .into_iter()
            .filter(|r| contains_ignore_case(&r.nome, pattern))
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DecisionRecord>, StoreError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn insert(&self, decision: NewDecision) -> Result<DecisionRecord, StoreError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let record = decision.into_record(table.next_id, Utc::now());
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn update_fields(&self, id: i64, patch: &DecisionPatch) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let record = table
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(record);
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|r| r.id != id);
        if table.rows.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn filtered_query(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(self
            .sorted(DateOrder::Descending)
            .await
            .into_iter()
            .filter(|r| criteria.matches(r))
            .collect())
    }
}
