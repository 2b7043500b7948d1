//! Core types and data models for indicator analytics
//!
//! This crate provides the records exchanged with the persistence layer
//! (indicators and their submissions), the anomaly detection configuration
//! attached to an indicator, and the tunable analysis settings.

pub mod anomaly;
pub mod errors;
pub mod indicator;
pub mod settings;
pub mod submissions;

pub use anomaly::{AnomalyConfig, OutlierConfig, OutlierMethod, TrendConfig, TrendMethod};
pub use errors::{IndicatorError, Result};
pub use indicator::{CategoryConfig, CategoryDefinition, Frequency, Indicator, IndicatorType};
pub use settings::{AnomalySettings, BackfillPolicy, ComplianceSettings, ForecastSettings};
pub use submissions::Submission;
