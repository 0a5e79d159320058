//! fedspend - search service over federal spending warehouse tables
//!
//! Exposes configured warehouse tables as datasets with:
//! - Structured JSON filters and comma-separated keyword search
//! - Paginated results with total counts
//! - A TTL result cache in front of the warehouse

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
