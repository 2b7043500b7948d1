//! Error types for the indicator data model

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Main error type for the data model
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Invalid category selection: {0}")]
    InvalidSelection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
