//! Anomaly Detection
//!
//! Pointwise outlier tests over a trailing window of an indicator's numeric
//! history. The window is the `window_size` most recent values up to and
//! including the value under test, which is always the last element.
//!
//! Detectors are stateless: callers hand in a slice of the series and get a
//! [`DetectionResult`] back. A window that is too short is reported as
//! [`DetectionStatus::NotEvaluable`] rather than as an error.

use indicator_types::{OutlierConfig, OutlierMethod};
use serde::{Deserialize, Serialize};

use crate::errors::{AnalyticsError, Result};
use crate::statistics::{finite_values, median, percentile, sorted};

/// Consistency constant that scales MAD to a normal standard deviation
pub const ROBUST_Z_SCALE: f64 = 0.6745;

/// Outcome class of a detector run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionStatus {
    /// Evaluated and within bounds
    Normal,
    /// Evaluated and flagged
    Anomaly,
    /// Not enough data to decide
    NotEvaluable,
}

/// Detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub status: DetectionStatus,
    /// Statistic compared against the threshold (higher = more anomalous)
    pub score: f64,
    /// Display text for the computed score or bounds
    pub detail: String,
}

impl DetectionResult {
    /// Create normal result
    pub fn normal(score: f64, detail: impl Into<String>) -> Self {
        Self {
            status: DetectionStatus::Normal,
            score,
            detail: detail.into(),
        }
    }

    /// Create anomaly result
    pub fn anomaly(score: f64, detail: impl Into<String>) -> Self {
        Self {
            status: DetectionStatus::Anomaly,
            score,
            detail: detail.into(),
        }
    }

    /// Create result for a window that cannot be judged
    pub fn not_evaluable(available: usize, required: usize) -> Self {
        Self {
            status: DetectionStatus::NotEvaluable,
            score: 0.0,
            detail: format!("{} of {} points available", available, required),
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.status == DetectionStatus::Anomaly
    }

    pub fn is_evaluable(&self) -> bool {
        self.status != DetectionStatus::NotEvaluable
    }
}

/// MAD or IQR outlier detector over a trailing window
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    method: OutlierMethod,
    threshold: f64,
    window_size: usize,
    min_points: usize,
}

impl OutlierDetector {
    /// Create new outlier detector
    pub fn new(
        method: OutlierMethod,
        threshold: f64,
        window_size: usize,
        min_points: usize,
    ) -> Result<Self> {
        if window_size < 2 {
            return Err(AnalyticsError::InvalidConfig(
                "Window size must be at least 2".to_string(),
            ));
        }

        if min_points < 2 || min_points > window_size {
            return Err(AnalyticsError::InvalidConfig(format!(
                "Minimum points must be between 2 and the window size {}",
                window_size
            )));
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
            min_points,
        })
    }

    /// Build from an indicator's outlier configuration
    pub fn from_config(config: &OutlierConfig) -> Result<Self> {
        Self::new(
            config.method,
            config.threshold,
            config.window_size,
            config.min_points,
        )
    }

    pub fn method(&self) -> OutlierMethod {
        self.method
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Test the last element of `window` against the rest
    ///
    /// Non-finite entries are dropped and only the trailing `window_size`
    /// values are used.
    pub fn evaluate(&self, window: &[f64]) -> DetectionResult {
        let values = finite_values(window);
        let start = values.len().saturating_sub(self.window_size);
        let values = &values[start..];

        if values.len() < self.min_points {
            return DetectionResult::not_evaluable(values.len(), self.min_points);
        }

        let Some(&value) = values.last() else {
            return DetectionResult::not_evaluable(0, self.min_points);
        };

        match self.method {
            OutlierMethod::Mad => self.evaluate_mad(values, value),
            OutlierMethod::Iqr => self.evaluate_iqr(values, value),
        }
    }

    /// Test `value` against the trailing part of `history`
    pub fn evaluate_point(&self, history: &[f64], value: f64) -> DetectionResult {
        let mut window: Vec<f64> = history
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        window.push(value);
        self.evaluate(&window)
    }

    fn evaluate_mad(&self, window: &[f64], value: f64) -> DetectionResult {
        let median = median(window);
        let deviations: Vec<f64> = window.iter().map(|x| (x - median).abs()).collect();
        let mad = percentile(&sorted(&deviations), 50.0);

        // Zero spread: any deviation from the median is flagged
        if mad == 0.0 {
            return if value != median {
                DetectionResult::anomaly(f64::INFINITY, "inf")
            } else {
                DetectionResult::normal(0.0, "0.00")
            };
        }

        let robust_z = ROBUST_Z_SCALE * (value - median) / mad;
        let score = robust_z.abs();
        let detail = format!("{:.2}", robust_z);

        if score > self.threshold {
            DetectionResult::anomaly(score, detail)
        } else {
            DetectionResult::normal(score, detail)
        }
    }

    fn evaluate_iqr(&self, window: &[f64], value: f64) -> DetectionResult {
        let sorted = sorted(window);
        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let lower_bound = q1 - self.threshold * iqr;
        let upper_bound = q3 + self.threshold * iqr;

        if iqr == 0.0 {
            let median = percentile(&sorted, 50.0);
            let detail = format!("bounds [{:.2}, {:.2}]", lower_bound, upper_bound);
            return if value != median {
                DetectionResult::anomaly(f64::INFINITY, format!("inf ({})", detail))
            } else {
                DetectionResult::normal(0.0, format!("0.00 ({})", detail))
            };
        }

        // Distance beyond the nearer quartile, in IQR units
        let distance = (q1 - value).max(value - q3).max(0.0);
        let score = distance / iqr;
        let detail = format!(
            "{:.2} (bounds [{:.2}, {:.2}])",
            score, lower_bound, upper_bound
        );

        if value < lower_bound || value > upper_bound {
            DetectionResult::anomaly(score, detail)
        } else {
            DetectionResult::normal(score, detail)
        }
    }
}
