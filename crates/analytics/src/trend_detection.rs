//! Trend Shift Detection
//!
//! Detects structural changes in an indicator's series by comparing the two
//! halves of a fully populated trailing window.

use indicator_types::{TrendConfig, TrendMethod};

use crate::anomaly_detection::DetectionResult;
use crate::errors::{AnalyticsError, Result};
use crate::statistics::{finite_values, linear_fit, mean};

/// Slope or mean shift detector
#[derive(Debug, Clone)]
pub struct TrendShiftDetector {
    method: TrendMethod,
    threshold: f64,
    window_size: usize,
}

impl TrendShiftDetector {
    /// Create new trend shift detector
    pub fn new(method: TrendMethod, threshold: f64, window_size: usize) -> Result<Self> {
        if window_size < 4 {
            return Err(AnalyticsError::InvalidConfig(
                "Trend window size must be at least 4".to_string(),
            ));
        }

        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(AnalyticsError::InvalidConfig(
                "Threshold must be positive".to_string(),
            ));
        }

        Ok(Self {
            method,
            threshold,
            window_size,
        })
    }

    /// Build from an indicator's trend configuration
    pub fn from_config(config: &TrendConfig) -> Result<Self> {
        Self::new(config.method, config.threshold, config.window_size)
    }

    pub fn method(&self) -> TrendMethod {
        self.method
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Compare the older and newer halves of the trailing window
    pub fn evaluate(&self, window: &[f64]) -> DetectionResult {
        let values = finite_values(window);
        if values.len() < self.window_size {
            return DetectionResult::not_evaluable(values.len(), self.window_size);
        }

        let mut values = &values[values.len() - self.window_size..];
        if values.len() % 2 == 1 {
            values = &values[1..];
        }
        let (prior, recent) = values.split_at(values.len() / 2);

        let (prior_stat, recent_stat) = match self.method {
            TrendMethod::SlopeShift => {
                match (linear_fit(prior), linear_fit(recent)) {
                    (Some(p), Some(r)) => (p.slope, r.slope),
                    _ => return DetectionResult::not_evaluable(values.len(), self.window_size),
                }
            }
            TrendMethod::MeanShift => match (mean(prior), mean(recent)) {
                (Some(p), Some(r)) => (p, r),
                _ => return DetectionResult::not_evaluable(values.len(), self.window_size),
            },
        };

        let shift = (recent_stat - prior_stat).abs();
        let detail = format!("prior {:.2}, recent {:.2}", prior_stat, recent_stat);

        if shift > self.threshold {
            DetectionResult::anomaly(shift, detail)
        } else {
            DetectionResult::normal(shift, detail)
        }
    }
}
