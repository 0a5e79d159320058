//! Business logic services

pub mod dataset;

pub use dataset::{DatasetMetadata, DatasetPage, DatasetQuery, DatasetService};
