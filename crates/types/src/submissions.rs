//! Submitted indicator values

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reported measurement for an indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Calendar date the value applies to
    pub reported_at: NaiveDate,
    /// Raw value as stored (decimal, "true"/"false", text, or comma-joined category ids)
    pub value: String,
    #[serde(default)]
    pub is_anomaly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Date the report was entered; falls back to `reported_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<NaiveDate>,
    /// Reporting entity used for compliance breakdowns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disaggregation_key: Option<String>,
}

impl Submission {
    /// Create a fresh, unevaluated submission
    pub fn new(reported_at: NaiveDate, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reported_at,
            value: value.into(),
            is_anomaly: false,
            anomaly_reason: None,
            evidence: None,
            submitted_at: None,
            disaggregation_key: None,
        }
    }

    /// Create a numeric submission
    pub fn numeric(reported_at: NaiveDate, value: f64) -> Self {
        Self::new(reported_at, value.to_string())
    }

    pub fn with_submitted_at(mut self, submitted_at: NaiveDate) -> Self {
        self.submitted_at = Some(submitted_at);
        self
    }

    pub fn with_disaggregation_key(mut self, key: impl Into<String>) -> Self {
        self.disaggregation_key = Some(key.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Parse the value as a finite number
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Date used for timeliness checks
    pub fn effective_submitted_at(&self) -> NaiveDate {
        self.submitted_at.unwrap_or(self.reported_at)
    }

    /// Split a categorical value into trimmed, de-duplicated ids
    pub fn category_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for part in self.value.split(',') {
            let id = part.trim();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
