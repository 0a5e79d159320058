//! The seam to the SQL-executing collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One result row, keyed by column name.
pub type Row = Map<String, JsonValue>;

/// Bind values passed alongside query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
}

/// Executes SQL text against the warehouse.
///
/// Implementations own connection handling and timeouts; errors are passed
/// through to the caller unchanged.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, binds: &[BindValue]) -> anyhow::Result<Vec<Row>>;
}

/// Rows as returned by an executor, plus timing and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
    /// Wall time of the execution that produced these rows.
    pub execution_time_ms: u64,
    /// True when served from the result cache.
    #[serde(default)]
    pub cached: bool,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>, execution_time_ms: u64) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            execution_time_ms,
            cached: false,
        }
    }

    /// Read an integer column from the first row, e.g. `TOTAL_COUNT`.
    ///
    /// Column lookup is case-insensitive because warehouses differ in how they
    /// fold unquoted aliases.
    pub fn first_i64(&self, column: &str) -> Option<i64> {
        let row = self.rows.first()?;
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .and_then(|(_, v)| match v {
                JsonValue::Number(n) => n.as_i64(),
                JsonValue::String(s) => s.parse().ok(),
                _ => None,
            })
    }
}
