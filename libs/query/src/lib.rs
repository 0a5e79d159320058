//! Filter/search-to-SQL compilation and result caching for warehouse tables.
//!
//! The engine turns a loosely-typed JSON filter object and a comma-separated
//! keyword string into SQL predicates, assembles paginated data/count query
//! pairs, and memoizes execution results with TTL-based invalidation.
//!
//! All SQL is built by escaped string interpolation. Field names are checked
//! against a [`ColumnAllowlist`] before they are quoted, and every literal
//! passes through [`escape::quote_literal`].

pub mod allowlist;
pub mod assemble;
pub mod cache;
pub mod error;
pub mod escape;
pub mod executor;
pub mod filter;
pub mod search;

pub use allowlist::ColumnAllowlist;
pub use assemble::{assemble, Pagination, QueryPlan, TableName};
pub use cache::{CacheConfig, CacheOptions, CacheStats, KeyDigest, ResultCache};
pub use error::{Error, Result};
pub use escape::{quote_identifier, quote_literal, text_operand};
pub use executor::{BindValue, QueryExecutor, QueryResult, Row};
pub use filter::{
    compile_filter, CompiledClause, ContractPreset, ExactOperator, FilterCompiler, FilterSpec,
    LogicalOperator,
};
pub use search::{compile_search, compile_search_with, SearchOptions, TermJoin};
