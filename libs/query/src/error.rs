//! Error types for the query engine

use thiserror::Error;

/// Compilation itself never fails: unknown fields and odd values degrade to an
/// empty clause. Errors only come from input validation and from the executor.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Query execution failed: {0:#}")]
    Execution(#[source] anyhow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
