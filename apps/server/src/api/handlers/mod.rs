//! Request handlers for API endpoints
//!
//! Handlers decode the request, call the dataset service and serialize the
//! result. Errors render through [`crate::Error`].

pub mod cache;
pub mod datasets;
pub mod health;

pub use health::{health_check, root};
