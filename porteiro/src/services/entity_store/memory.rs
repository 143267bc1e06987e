use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::backend::{StorageBackend, StoreError, Table};

/// In-memory backing store used by the demo binary and tests. Mirrors the
/// row/equality-filter contract of a relational backend without any
/// cross-call atomicity.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn row_id(row: &Value) -> Result<String, StoreError> {
    row.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::new("row is missing a string id"))
}

fn matches(row: &Value, filter: &[(&str, String)]) -> bool {
    filter
        .iter()
        .all(|(column, value)| row.get(*column).and_then(Value::as_str) == Some(value.as_str()))
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn select(
        &self,
        table: Table,
        filter: &[(&str, String)],
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        row_id(&row)?;
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, row: Value) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let slot = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| {
                StoreError::new(format!("no row with id {id} in {}", table.as_str()))
            })?;
        *slot = row.clone();
        Ok(row)
    }

    async fn delete(&self, table: Table, id: &str) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let index = rows
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| {
                StoreError::new(format!("no row with id {id} in {}", table.as_str()))
            })?;
        Ok(rows.remove(index))
    }
}
