//! Indicator analytics engine
//!
//! This crate provides the analytics behind indicator tracking: robust
//! outlier detection (MAD and IQR), trend shift detection, anomaly evaluation
//! at insert time and on recompute, linear forecasting, reporting compliance
//! and categorical distributions over calendar periods.

pub mod anomaly_detection;
pub mod category;
pub mod compliance;
pub mod errors;
pub mod evaluator;
pub mod forecast;
pub mod periods;
pub mod series;
pub mod statistics;
pub mod trend_detection;

pub use anomaly_detection::{DetectionResult, DetectionStatus, OutlierDetector, ROBUST_Z_SCALE};
pub use category::{
    parse_selection, CategoryAggregator, CategoryPeriod, CategoryShare, CategoryTimeSeriesRequest,
};
pub use compliance::{
    ComplianceCalculator, ComplianceReport, ComplianceRequest, ComplianceStats, PeriodCompliance,
    ReportStatus,
};
pub use errors::{AnalyticsError, Result};
pub use evaluator::{AnomalyEvaluator, AnomalyKind, InsertOutcome, RecomputeSummary, Verdict};
pub use forecast::{
    forecast, forecast_with_settings, forecast_with_step, ForecastPoint, DEFAULT_PERIODS,
    DEFAULT_STEP_DAYS,
};
pub use periods::{calendar_periods, cadence_periods, GroupBy, Period};
pub use series::{Placement, SubmissionSeries};
pub use trend_detection::TrendShiftDetector;
