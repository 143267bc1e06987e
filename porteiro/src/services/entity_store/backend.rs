use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tables of the relational backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Modules,
    UserTypes,
    Users,
    Permissions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Modules => "modules",
            Table::UserTypes => "user_types",
            Table::Users => "users",
            Table::Permissions => "permissions",
        }
    }
}

/// Opaque backing-store failure; the `{message}` shape of the store contract.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
        }
    }
}

/// Replaceable row-oriented backing store.
///
/// Rows travel as opaque JSON documents; filters are column/value equality
/// pairs. Every call is fallible and there are no transactional guarantees
/// across calls; callers needing consistency sequence explicitly.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn select(
        &self,
        table: Table,
        filter: &[(&str, String)],
    ) -> Result<Vec<Value>, StoreError>;

    /// Insert a row. The row must already carry its `id`.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError>;

    /// Replace the row with the given id.
    async fn update(&self, table: Table, id: &str, row: Value) -> Result<Value, StoreError>;

    /// Remove and return the row with the given id.
    async fn delete(&self, table: Table, id: &str) -> Result<Value, StoreError>;
}
