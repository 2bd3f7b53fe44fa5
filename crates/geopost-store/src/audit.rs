use async_trait::async_trait;

use crate::error::StoreResult;

/// One cell write: `family:column = value` at `timestamp_micros`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCell {
    pub family: String,
    pub column: String,
    pub timestamp_micros: i64,
    pub value: Vec<u8>,
}

/// A batch of cell writes against a single row, applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    cells: Vec<SetCell>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        family: &str,
        column: &str,
        timestamp_micros: i64,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.cells.push(SetCell {
            family: family.to_string(),
            column: column.to_string(),
            timestamp_micros,
            value: value.into(),
        });
        self
    }

    pub fn cells(&self) -> &[SetCell] {
        &self.cells
    }
}

/// Wide-column store that keeps the redundant copy of every post.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn apply_mutation(&self, table: &str, row_key: &str, mutation: &Mutation) -> StoreResult<()>;
}
