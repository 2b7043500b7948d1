//! Indicator analytics CLI library
//!
//! Input loading, output formatting and the command implementations behind
//! the `indicator-analytics` binary.

pub mod commands;
pub mod input;
pub mod output;

use thiserror::Error;

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] indicator_config::ConfigError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;

pub use input::{load_datasets, parse_datasets, Dataset};
pub use output::{get_formatter, Formatter, OutputFormat, Section};
