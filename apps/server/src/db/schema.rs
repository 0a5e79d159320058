//! Column discovery through `information_schema`.

use std::sync::Arc;
use std::time::Duration;

use fedspend_query::{BindValue, CacheOptions, ResultCache, Row, TableName};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::Result;

pub const SCHEMA_CACHE_LABEL: &str = "schema";
const DEFAULT_SCHEMA: &str = "public";

const COLUMNS_QUERY: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE lower(table_schema) = lower($1) AND lower(table_name) = lower($2) \
     ORDER BY ordinal_position";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Looks up the column list of a dataset table. Results go through the shared
/// result cache under the `schema` label.
#[derive(Clone)]
pub struct SchemaRepository {
    cache: Arc<ResultCache>,
    ttl: Duration,
}

impl SchemaRepository {
    pub fn new(cache: Arc<ResultCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Columns in ordinal order. An unknown table yields an empty list.
    pub async fn columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>> {
        let binds = [
            BindValue::Text(table.schema().unwrap_or(DEFAULT_SCHEMA).to_string()),
            BindValue::Text(table.table().to_string()),
        ];
        let options = CacheOptions::labeled(SCHEMA_CACHE_LABEL).with_ttl(self.ttl);

        let result = self
            .cache
            .get_or_execute(COLUMNS_QUERY, &binds, &options)
            .await?;

        let columns: Vec<ColumnInfo> = result.rows.iter().filter_map(column_from_row).collect();
        tracing::debug!(
            %table,
            columns = columns.len(),
            cached = result.cached,
            "Loaded table columns"
        );
        Ok(columns)
    }
}

fn text_field(row: &Row, name: &str) -> Option<String> {
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| match v {
            JsonValue::String(s) => Some(s.clone()),
            _ => None,
        })
}

fn column_from_row(row: &Row) -> Option<ColumnInfo> {
    Some(ColumnInfo {
        name: text_field(row, "column_name")?,
        data_type: text_field(row, "data_type").unwrap_or_default(),
    })
}
