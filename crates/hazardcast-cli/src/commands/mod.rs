//! CLI command handlers.
//!
//! # Modules
//!
//! - `build_dataset`: assemble and split train/test datasets
//! - `forecast`: per-site scoring from external model probabilities
//! - `score_routes`: route-level aggregation of site predictions

pub mod build_dataset;
pub mod forecast;
pub mod score_routes;
