//! Configuration management for indicator analytics

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use indicator_types::{AnomalySettings, ComplianceSettings, ForecastSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "INDICATOR_";

/// Main analytics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Anomaly evaluation settings
    #[serde(default)]
    pub anomaly: AnomalySettings,

    /// Reporting compliance settings
    #[serde(default)]
    pub compliance: ComplianceSettings,

    /// Forecast settings
    #[serde(default)]
    pub forecast: ForecastSettings,

    /// Observability settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AnalyticsConfig {
    /// Load configuration from defaults, an optional YAML file, and the environment
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AnalyticsConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        // Override with environment variables (prefixed with INDICATOR_)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.forecast.periods == 0 {
            return Err(ConfigError::ValidationError(
                "forecast.periods must be at least 1".to_string(),
            ));
        }

        if self.forecast.step_days == 0 {
            return Err(ConfigError::ValidationError(
                "forecast.step_days must be at least 1".to_string(),
            ));
        }

        if self.observability.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError("Log level required".to_string()));
        }

        Ok(())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,

    /// Enable structured JSON logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
