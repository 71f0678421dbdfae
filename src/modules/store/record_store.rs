use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::Result;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Record-oriented access to the remote film store.
///
/// The store enforces its own access-control policy; implementations only
/// classify its failures, they never re-derive business rules. Rows travel as
/// raw JSON values so each feature decodes exactly the columns it asked for.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Select `columns` from `table`, optionally ordered by a
    /// `column.direction` spec such as `created_at.desc`.
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
        order: Option<&str>,
    ) -> Result<Vec<Value>>;

    /// Insert one record and return the stored representation.
    async fn insert(&self, table: &str, record: Value) -> Result<Value>;

    /// Update records matching `filters` and return the first updated row.
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Value>;

    /// Delete records matching `filters`.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()>;

    /// Invoke a stored server-side function with JSON arguments.
    async fn rpc(&self, function: &str, args: Value) -> Result<Value>;
}
