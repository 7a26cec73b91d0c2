//! Error types for hazardcast-core.

use thiserror::Error;

use crate::window::WindowKind;

/// Top-level error type for hazardcast-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("Window kind mismatch: expected {expected}, got {actual}")]
    WindowKindMismatch {
        expected: WindowKind,
        actual: WindowKind,
    },

    #[error("Probability out of range: {value} (must be within [0, 1])")]
    InvalidProbability { value: f64 },

    #[error("Site not found: {name}")]
    SiteNotFound { name: String },

    #[error("Weather provider error: {0}")]
    WeatherError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
