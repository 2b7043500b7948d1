//! Anomaly Evaluation
//!
//! Combines the hard expected range with the statistical detectors configured
//! on an indicator and writes the verdict onto submissions. Two modes share
//! the same detectors:
//!
//! - insert-time: [`AnomalyEvaluator::evaluate_insert`] judges a new
//!   submission against the history dated on or before it;
//! - batch: [`AnomalyEvaluator::recompute`] re-runs the whole series in
//!   chronological order, e.g. after a configuration change.

use indicator_types::{BackfillPolicy, Indicator, IndicatorType, Submission};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    anomaly_detection::OutlierDetector,
    errors::Result,
    series::SubmissionSeries,
    trend_detection::TrendShiftDetector,
};

/// Which check produced a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Value under `minExpected`
    BelowMinimum,
    /// Value over `maxExpected`
    AboveMaximum,
    /// Statistical outlier
    Outlier,
    /// Trend shift
    TrendShift,
}

/// Evaluation outcome for one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_anomaly: bool,
    /// Human-readable reason; empty when not anomalous
    pub anomaly_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnomalyKind>,
}

impl Verdict {
    /// Not anomalous
    pub fn normal() -> Self {
        Self {
            is_anomaly: false,
            anomaly_reason: String::new(),
            kind: None,
        }
    }

    /// Anomalous with a reason
    pub fn anomaly(kind: AnomalyKind, reason: impl Into<String>) -> Self {
        Self {
            is_anomaly: true,
            anomaly_reason: reason.into(),
            kind: Some(kind),
        }
    }

    /// Write the verdict onto a submission, returning whether its flag changed
    pub fn apply_to(&self, submission: &mut Submission) -> bool {
        let reason = if self.anomaly_reason.is_empty() {
            None
        } else {
            Some(self.anomaly_reason.clone())
        };
        let changed = submission.is_anomaly != self.is_anomaly || submission.anomaly_reason != reason;
        submission.is_anomaly = self.is_anomaly;
        submission.anomaly_reason = reason;
        changed
    }
}

/// Result of evaluating a newly inserted submission
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub submission_id: Uuid,
    /// Chronological position in the series
    pub position: usize,
    pub verdict: Verdict,
    /// The submission was dated before existing ones
    pub out_of_order: bool,
    /// Re-evaluation of later submissions, when the backfill policy asked for it
    pub recomputed: Option<RecomputeSummary>,
}

/// Counters from a batch re-evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSummary {
    /// Submissions evaluated
    pub evaluated: usize,
    /// Submissions flagged after evaluation
    pub flagged: usize,
    /// Submissions whose flag or reason changed
    pub changed: usize,
}

/// Per-indicator anomaly evaluator
#[derive(Debug, Clone)]
pub struct AnomalyEvaluator {
    indicator_id: Uuid,
    indicator_type: IndicatorType,
    min_expected: Option<f64>,
    max_expected: Option<f64>,
    outlier: Option<OutlierDetector>,
    trend: Option<TrendShiftDetector>,
    backfill_policy: BackfillPolicy,
}

impl AnomalyEvaluator {
    /// Create new evaluator, validating the indicator's configuration
    pub fn new(indicator: &Indicator) -> Result<Self> {
        indicator.validate()?;

        let (outlier, trend) = match &indicator.anomaly_config {
            Some(config) if config.enabled => (
                config
                    .outlier
                    .as_ref()
                    .map(OutlierDetector::from_config)
                    .transpose()?,
                config
                    .trend
                    .as_ref()
                    .map(TrendShiftDetector::from_config)
                    .transpose()?,
            ),
            _ => (None, None),
        };

        Ok(Self {
            indicator_id: indicator.id,
            indicator_type: indicator.indicator_type,
            min_expected: indicator.min_expected,
            max_expected: indicator.max_expected,
            outlier,
            trend,
            backfill_policy: BackfillPolicy::default(),
        })
    }

    /// Set what happens to later submissions on an out-of-order insert
    pub fn with_backfill_policy(mut self, policy: BackfillPolicy) -> Self {
        self.backfill_policy = policy;
        self
    }

    pub fn backfill_policy(&self) -> BackfillPolicy {
        self.backfill_policy
    }

    /// Number of prior values the detectors can use
    pub fn history_len(&self) -> usize {
        let outlier = self.outlier.as_ref().map_or(0, |d| d.window_size() - 1);
        let trend = self.trend.as_ref().map_or(0, |d| d.window_size() - 1);
        outlier.max(trend)
    }

    /// Evaluate a raw value against prior numeric history (oldest first)
    pub fn evaluate(&self, value: &str, history: &[f64]) -> Verdict {
        if !self.indicator_type.is_numeric() {
            return Verdict::normal();
        }

        let Some(value) = value.trim().parse::<f64>().ok().filter(|v| v.is_finite()) else {
            debug!(
                indicator_id = %self.indicator_id,
                value,
                "Skipping evaluation of non-numeric value"
            );
            return Verdict::normal();
        };

        // Check hard thresholds
        if let Some(min) = self.min_expected {
            if value < min {
                return Verdict::anomaly(
                    AnomalyKind::BelowMinimum,
                    format!("value below expected minimum ({})", min),
                );
            }
        }

        if let Some(max) = self.max_expected {
            if value > max {
                return Verdict::anomaly(
                    AnomalyKind::AboveMaximum,
                    format!("value exceeds expected maximum ({})", max),
                );
            }
        }

        // Check statistical outliers
        if let Some(detector) = &self.outlier {
            let result = detector.evaluate_point(history, value);
            if result.is_anomaly() {
                return Verdict::anomaly(
                    AnomalyKind::Outlier,
                    format!("{} outlier, score={}", detector.method(), result.detail),
                );
            }
        }

        // Check trend shifts
        if let Some(detector) = &self.trend {
            let mut window = history.to_vec();
            window.push(value);
            let result = detector.evaluate(&window);
            if result.is_anomaly() {
                return Verdict::anomaly(
                    AnomalyKind::TrendShift,
                    format!("{} trend shift detected", detector.method()),
                );
            }
        }

        Verdict::normal()
    }

    /// Evaluate the submission at a chronological position of the series
    pub fn evaluate_at(&self, series: &SubmissionSeries, position: usize) -> Option<Verdict> {
        let submission = series.get(position)?;
        let history = series.values_before(position, self.history_len());
        Some(self.evaluate(&submission.value, &history))
    }

    /// Insert a new submission and write its verdict
    pub fn evaluate_insert(
        &self,
        series: &mut SubmissionSeries,
        submission: Submission,
    ) -> InsertOutcome {
        let submission_id = submission.id;
        let placement = series.push(submission);
        let verdict = self
            .evaluate_at(series, placement.position)
            .unwrap_or_else(Verdict::normal);

        if let Some(stored) = series.get_mut(placement.position) {
            verdict.apply_to(stored);
        }

        if verdict.is_anomaly {
            debug!(
                indicator_id = %self.indicator_id,
                submission_id = %submission_id,
                reason = %verdict.anomaly_reason,
                "Submission flagged as anomalous"
            );
        }

        let recomputed = if placement.out_of_order
            && self.backfill_policy == BackfillPolicy::RecomputeLater
        {
            let summary = self.recompute_from(series, placement.position + 1);
            info!(
                indicator_id = %self.indicator_id,
                submission_id = %submission_id,
                evaluated = summary.evaluated,
                changed = summary.changed,
                "Re-evaluated submissions after backfilled insert"
            );
            Some(summary)
        } else {
            None
        };

        InsertOutcome {
            submission_id,
            position: placement.position,
            verdict,
            out_of_order: placement.out_of_order,
            recomputed,
        }
    }

    /// Re-evaluate every submission in chronological order
    pub fn recompute(&self, series: &mut SubmissionSeries) -> RecomputeSummary {
        let summary = self.recompute_from(series, 0);
        info!(
            indicator_id = %self.indicator_id,
            evaluated = summary.evaluated,
            flagged = summary.flagged,
            changed = summary.changed,
            "Batch anomaly recompute finished"
        );
        summary
    }

    fn recompute_from(&self, series: &mut SubmissionSeries, start: usize) -> RecomputeSummary {
        let mut summary = RecomputeSummary::default();

        for position in start..series.len() {
            let Some(verdict) = self.evaluate_at(series, position) else {
                continue;
            };
            summary.evaluated += 1;
            if verdict.is_anomaly {
                summary.flagged += 1;
            }
            if let Some(submission) = series.get_mut(position) {
                if verdict.apply_to(submission) {
                    summary.changed += 1;
                }
            }
        }

        summary
    }
}
