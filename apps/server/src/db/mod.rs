//! Database layer - warehouse execution and schema lookups

pub mod schema;
pub mod warehouse;

pub use schema::{ColumnInfo, SchemaRepository};
pub use warehouse::PgWarehouse;
