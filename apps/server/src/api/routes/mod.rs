//! Route tables

pub mod datasets;
