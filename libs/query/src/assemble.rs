//! Paginated data/count query assembly.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::allowlist::ColumnAllowlist;
use crate::error::{Error, Result};
use crate::escape::quote_identifier;
use crate::filter::CompiledClause;

/// Sort key used when neither an explicit order nor any column is known.
pub const FALLBACK_ORDER_COLUMN: &str = "ID";

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid table segment regex"))
}

/// A validated, optionally qualified table name such as `FOUNDRY.SAM_CONTRACTS.RAW_CSV`.
///
/// Table names come from configuration, never from requests, and are rendered
/// verbatim so the warehouse applies its own case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName {
    segments: Vec<String>,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.trim().split('.').map(str::to_string).collect();
        if segments.len() > 3 || segments.iter().any(|s| !segment_regex().is_match(s)) {
            return Err(Error::InvalidTableName(raw.to_string()));
        }
        Ok(Self { segments })
    }

    /// Unqualified table part.
    pub fn table(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Schema part, when the name has at least two segments.
    pub fn schema(&self) -> Option<&str> {
        let n = self.segments.len();
        (n >= 2).then(|| self.segments[n - 2].as_str())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for TableName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.to_string()
    }
}

/// 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::InvalidPagination("page must be >= 1".to_string()));
        }
        if page_size == 0 {
            return Err(Error::InvalidPagination("page_size must be >= 1".to_string()));
        }
        Ok(Self { page, page_size })
    }

    /// Cap the page size. The engine itself enforces no maximum.
    pub fn clamped(self, max_page_size: u32) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.min(max_page_size.max(1)),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Data and count statements for one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub data_query: String,
    pub count_query: String,
    /// Shared `WHERE ...` text, empty when unfiltered.
    pub where_clause: String,
}

/// Combine filter and search fragments into a `WHERE` clause.
pub fn where_clause(filter: &CompiledClause, search: &CompiledClause) -> String {
    match (filter.is_empty(), search.is_empty()) {
        (false, false) => format!("WHERE ({filter}) AND ({search})"),
        (false, true) => format!("WHERE {filter}"),
        (true, false) => format!("WHERE {search}"),
        (true, true) => String::new(),
    }
}

/// Pick the sort column: an allowlisted `order_by`, else the first known
/// column, else [`FALLBACK_ORDER_COLUMN`].
pub fn order_column(allowlist: &ColumnAllowlist, order_by: Option<&str>) -> String {
    let column = order_by
        .filter(|c| allowlist.contains(c))
        .or_else(|| allowlist.first())
        .unwrap_or(FALLBACK_ORDER_COLUMN);
    quote_identifier(column)
}

/// Build the paginated data query and its unpaginated count companion.
pub fn assemble(
    table: &TableName,
    filter: &CompiledClause,
    search: &CompiledClause,
    pagination: Pagination,
    allowlist: &ColumnAllowlist,
    order_by: Option<&str>,
) -> QueryPlan {
    let where_clause = where_clause(filter, search);
    let order = order_column(allowlist, order_by);

    let data_query = format!(
        "SELECT * FROM {table} {where_clause} ORDER BY {order} LIMIT {} OFFSET {}",
        pagination.page_size(),
        pagination.offset()
    );
    let count_query = format!("SELECT COUNT(*) AS total_count FROM {table} {where_clause}");

    tracing::debug!(%table, data_query = %data_query, "Assembled query plan");

    QueryPlan {
        data_query,
        count_query,
        where_clause,
    }
}
