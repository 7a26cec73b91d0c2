//! Error types for hazardcast-dataset.

use std::path::PathBuf;

use thiserror::Error;

use hazardcast_core::error::CoreError;

/// Top-level error type for dataset assembly and I/O.
///
/// Only conditions that invalidate an entire build are errors here.
/// Per-row problems (malformed CSV rows, failed weather fetches) degrade
/// locally and are reported as aggregate counts.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Required {kind} data not found: {path}")]
    MissingSource { kind: String, path: PathBuf },

    #[error("{kind} store is empty; cannot label a {kind} dataset")]
    EmptySource { kind: String },

    #[error("Site registry is empty")]
    NoSites,

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid split parameter: {0}")]
    InvalidSplit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
