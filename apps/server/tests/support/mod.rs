#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use fedspend::{api::create_router, AppState, Config};
use fedspend_query::{BindValue, QueryExecutor, Row};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt as _;

/// In-memory stand-in for the warehouse. Answers schema, count, version and
/// data statements from canned values and records every statement it sees.
pub struct StubWarehouse {
    tables: HashMap<String, Vec<&'static str>>,
    rows: Vec<Row>,
    total_count: i64,
    failing: AtomicBool,
    statements: Mutex<Vec<String>>,
}

impl StubWarehouse {
    pub fn new() -> Self {
        let tables = HashMap::from([
            (
                "opportunities".to_string(),
                vec![
                    "NOTICEID",
                    "TITLE",
                    "TYPE",
                    "AWARD$",
                    "AWARDEE",
                    "Department/Ind.Agency",
                    "AWARD_ID_PIID",
                    "POSTEDDATE",
                ],
            ),
            (
                "budget".to_string(),
                vec!["ID", "AGENCY_NAME", "FISCAL_YEAR", "AMOUNT", "PROGRAM"],
            ),
        ]);
        let rows = vec![
            json!({"NOTICEID": "N-1", "TITLE": "Cyber range support"}),
            json!({"NOTICEID": "N-2", "TITLE": "Network modernization"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        Self {
            tables,
            rows,
            total_count: 42,
            failing: AtomicBool::new(false),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.lock().unwrap().len()
    }

    /// Statements that read dataset rows, excluding schema and count lookups.
    pub fn data_statements(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| s.starts_with("SELECT * FROM"))
            .collect()
    }

    pub fn count_statements(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| s.starts_with("SELECT COUNT(*)"))
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for StubWarehouse {
    async fn execute(&self, sql: &str, binds: &[BindValue]) -> anyhow::Result<Vec<Row>> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        self.statements.lock().unwrap().push(sql.to_string());

        let rows = if sql.contains("information_schema.columns") {
            let table = match binds.get(1) {
                Some(BindValue::Text(t)) => t.to_lowercase(),
                _ => String::new(),
            };
            self.tables
                .get(&table)
                .map(|columns| {
                    columns
                        .iter()
                        .map(|c| json!({"column_name": c, "data_type": "text"}))
                        .collect()
                })
                .unwrap_or_default()
        } else if sql.starts_with("SELECT version()") {
            vec![json!({"version": "PostgreSQL 16.2"})]
        } else if sql.starts_with("SELECT COUNT(*)") {
            vec![json!({"total_count": self.total_count})]
        } else {
            return Ok(self.rows.clone());
        };

        Ok(rows
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub warehouse: Arc<StubWarehouse>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::new_with_config(|_| {})
    }

    pub fn new_with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::with_default_datasets();
        configure(&mut config);

        let warehouse = Arc::new(StubWarehouse::new());
        let state = AppState::with_executor(config, warehouse.clone())
            .expect("build app state around stub warehouse");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            warehouse,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<JsonValue>,
    ) -> anyhow::Result<(StatusCode, JsonValue)> {
        let mut builder = Request::builder().method(method).uri(path_and_query);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value).context("encode request body")?)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).context("decode response body")?
        };

        Ok((status, json))
    }

    pub async fn get(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, JsonValue)> {
        self.request(Method::GET, path_and_query, None).await
    }

    pub async fn post(
        &self,
        path_and_query: &str,
        body: JsonValue,
    ) -> anyhow::Result<(StatusCode, JsonValue)> {
        self.request(Method::POST, path_and_query, Some(body)).await
    }
}
