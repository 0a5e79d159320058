//! Postgres-backed [`QueryExecutor`].

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use fedspend_query::{BindValue, QueryExecutor, Row};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::Result;

/// Runs generated SQL against Postgres and returns each row as a JSON object.
///
/// Statements are wrapped in `SELECT row_to_json(q) ...` so arbitrary column
/// sets decode without a static row type.
#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "Connected to warehouse"
        );
        Ok(Self { pool })
    }
}

pub(crate) fn wrap_as_json(sql: &str) -> String {
    format!("SELECT row_to_json(q) AS row FROM ({sql}) q")
}

#[async_trait]
impl QueryExecutor for PgWarehouse {
    async fn execute(&self, sql: &str, binds: &[BindValue]) -> anyhow::Result<Vec<Row>> {
        let wrapped = wrap_as_json(sql);

        let mut query = sqlx::query_scalar::<_, JsonValue>(&wrapped);
        for value in binds {
            query = match value {
                BindValue::Text(v) => query.bind(v.clone()),
                BindValue::TextArray(vs) => query.bind(vs.clone()),
            };
        }

        let values = query
            .fetch_all(&self.pool)
            .await
            .context("warehouse query failed")?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                JsonValue::Object(row) => Some(row),
                _ => None,
            })
            .collect())
    }
}
