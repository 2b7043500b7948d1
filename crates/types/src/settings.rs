//! Tunable analysis settings

use serde::{Deserialize, Serialize};

/// What happens to later flags when a submission is inserted out of order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackfillPolicy {
    /// Re-evaluate every submission dated after the backfilled one
    RecomputeLater,
    /// Evaluate only the inserted submission
    KeepExisting,
}

impl Default for BackfillPolicy {
    fn default() -> Self {
        Self::RecomputeLater
    }
}

/// Anomaly evaluation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalySettings {
    #[serde(default)]
    pub backfill_policy: BackfillPolicy,
}

/// Reporting compliance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSettings {
    /// Days after a period ends during which a report still counts as on time
    pub grace_days: u32,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self { grace_days: 0 }
    }
}

/// Forecast settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Number of projected points
    pub periods: usize,
    /// Spacing between projected points in days
    pub step_days: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            periods: 4,
            step_days: 7,
        }
    }
}
