//! Anomaly detection configuration attached to an indicator

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{IndicatorError, Result};

/// Statistical outlier test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// Robust z-score over the median absolute deviation
    #[serde(rename = "MAD")]
    Mad,
    /// Tukey fences over the interquartile range
    #[serde(rename = "IQR")]
    Iqr,
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mad => f.write_str("MAD"),
            Self::Iqr => f.write_str("IQR"),
        }
    }
}

/// Structural change test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendMethod {
    /// Compare least-squares slopes of the two window halves
    SlopeShift,
    /// Compare means of the two window halves
    MeanShift,
}

impl fmt::Display for TrendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlopeShift => f.write_str("SLOPE_SHIFT"),
            Self::MeanShift => f.write_str("MEAN_SHIFT"),
        }
    }
}

/// Outlier detector settings
///
/// `threshold` is the robust z cutoff for MAD and the fence multiplier for IQR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierConfig {
    pub method: OutlierMethod,
    pub threshold: f64,
    pub window_size: usize,
    pub min_points: usize,
}

impl OutlierConfig {
    /// MAD detector with the conventional 3.5 cutoff
    pub fn mad(window_size: usize, min_points: usize) -> Self {
        Self {
            method: OutlierMethod::Mad,
            threshold: 3.5,
            window_size,
            min_points,
        }
    }

    /// IQR detector with the conventional 1.5 fence multiplier
    pub fn iqr(window_size: usize, min_points: usize) -> Self {
        Self {
            method: OutlierMethod::Iqr,
            threshold: 1.5,
            window_size,
            min_points,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(IndicatorError::Validation(
                "outlier threshold must be positive".to_string(),
            ));
        }
        if self.window_size < 2 {
            return Err(IndicatorError::Validation(
                "outlier windowSize must be at least 2".to_string(),
            ));
        }
        if self.min_points < 2 {
            return Err(IndicatorError::Validation(
                "outlier minPoints must be at least 2".to_string(),
            ));
        }
        if self.min_points > self.window_size {
            return Err(IndicatorError::Validation(format!(
                "outlier minPoints {} exceeds windowSize {}",
                self.min_points, self.window_size
            )));
        }
        Ok(())
    }
}

/// Trend shift detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendConfig {
    pub method: TrendMethod,
    pub threshold: f64,
    pub window_size: usize,
}

impl TrendConfig {
    pub fn new(method: TrendMethod, threshold: f64, window_size: usize) -> Self {
        Self {
            method,
            threshold,
            window_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(IndicatorError::Validation(
                "trend threshold must be positive".to_string(),
            ));
        }
        if self.window_size < 4 {
            return Err(IndicatorError::Validation(
                "trend windowSize must be at least 4".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-indicator anomaly detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier: Option<OutlierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendConfig>,
}

impl AnomalyConfig {
    /// Enabled configuration with only an outlier test
    pub fn outlier_only(outlier: OutlierConfig) -> Self {
        Self {
            enabled: true,
            outlier: Some(outlier),
            trend: None,
        }
    }

    pub fn with_trend(mut self, trend: TrendConfig) -> Self {
        self.trend = Some(trend);
        self
    }

    /// Validate both detector families, even when disabled
    pub fn validate(&self) -> Result<()> {
        if let Some(outlier) = &self.outlier {
            outlier.validate()?;
        }
        if let Some(trend) = &self.trend {
            trend.validate()?;
        }
        Ok(())
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            outlier: None,
            trend: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_names() {
        let json = r#"{"enabled":true,
            "outlier":{"method":"IQR","threshold":1.5,"windowSize":10,"minPoints":4},
            "trend":{"method":"SLOPE_SHIFT","threshold":0.5,"windowSize":8}}"#;
        let config: AnomalyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.outlier.as_ref().unwrap().method, OutlierMethod::Iqr);
        assert_eq!(config.trend.as_ref().unwrap().method, TrendMethod::SlopeShift);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let json = r#"{"method":"ZSCORE","threshold":3.0,"windowSize":10,"minPoints":4}"#;
        assert!(serde_json::from_str::<OutlierConfig>(json).is_err());
    }

    #[test]
    fn test_outlier_validation() {
        assert!(OutlierConfig::mad(10, 4).validate().is_ok());
        assert!(OutlierConfig::mad(1, 1).validate().is_err());
        assert!(OutlierConfig::mad(10, 1).validate().is_err());
        assert!(OutlierConfig::mad(4, 5).validate().is_err());
        assert!(OutlierConfig::mad(10, 4).with_threshold(0.0).validate().is_err());
        assert!(OutlierConfig::iqr(10, 4).with_threshold(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_trend_validation() {
        assert!(TrendConfig::new(TrendMethod::MeanShift, 1.0, 4).validate().is_ok());
        assert!(TrendConfig::new(TrendMethod::MeanShift, 1.0, 3).validate().is_err());
        assert!(TrendConfig::new(TrendMethod::SlopeShift, -1.0, 8).validate().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(OutlierMethod::Mad.to_string(), "MAD");
        assert_eq!(TrendMethod::MeanShift.to_string(), "MEAN_SHIFT");
    }
}
