//! Middleware stack for the API

pub mod layers;

pub use layers::{cors, trace};
