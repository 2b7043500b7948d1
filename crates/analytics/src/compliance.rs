//! Reporting Compliance
//!
//! Compares the submissions received for an indicator with the reports its
//! cadence expects over a date range. A period counts as received when at
//! least one submission is dated inside it; it is on time when the earliest
//! of those was entered no later than the period end plus the grace period.

use chrono::{Duration, NaiveDate};
use indicator_types::{ComplianceSettings, Frequency, Indicator, Submission};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::Result;
use crate::periods::{cadence_periods, locate, Period};

/// Status of one expected report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    OnTime,
    Late,
    Missing,
}

/// Compliance of one expected period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCompliance {
    #[serde(flatten)]
    pub period: Period,
    pub status: ReportStatus,
    /// Submissions dated inside the period
    pub submissions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_submitted_at: Option<NaiveDate>,
}

/// Aggregate counts over a set of expected periods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStats {
    pub expected_reports: usize,
    pub received_reports: usize,
    pub on_time_reports: usize,
    pub late_reports: usize,
    pub missing_reports: usize,
    /// `received / expected`; 1.0 when nothing is expected
    pub compliance_rate: f64,
}

impl ComplianceStats {
    fn tally(periods: &[PeriodCompliance]) -> Self {
        let expected = periods.len();
        let on_time = periods
            .iter()
            .filter(|p| p.status == ReportStatus::OnTime)
            .count();
        let late = periods
            .iter()
            .filter(|p| p.status == ReportStatus::Late)
            .count();
        let received = on_time + late;

        Self {
            expected_reports: expected,
            received_reports: received,
            on_time_reports: on_time,
            late_reports: late,
            missing_reports: expected - received,
            compliance_rate: if expected == 0 {
                1.0
            } else {
                received as f64 / expected as f64
            },
        }
    }
}

/// Full compliance report for one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub grace_days: u32,
    #[serde(flatten)]
    pub stats: ComplianceStats,
    pub periods: Vec<PeriodCompliance>,
    /// Per reporting entity; empty when no submission carries a key
    pub by_disaggregation: BTreeMap<String, ComplianceStats>,
}

impl ComplianceReport {
    /// Disaggregation entries by descending compliance rate, ties by key
    pub fn ranked_by_compliance(&self) -> Vec<(&str, &ComplianceStats)> {
        let mut ranked: Vec<(&str, &ComplianceStats)> = self
            .by_disaggregation
            .iter()
            .map(|(key, stats)| (key.as_str(), stats))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.compliance_rate
                .total_cmp(&a.1.compliance_rate)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }
}

/// Query parameters of a reporting-compliance request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Overrides the indicator's own frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_frequency: Option<Frequency>,
}

/// Expected-vs-received calculator
#[derive(Debug, Clone, Default)]
pub struct ComplianceCalculator {
    grace_days: u32,
}

impl ComplianceCalculator {
    pub fn new(grace_days: u32) -> Self {
        Self { grace_days }
    }

    pub fn from_settings(settings: &ComplianceSettings) -> Self {
        Self::new(settings.grace_days)
    }

    pub fn grace_days(&self) -> u32 {
        self.grace_days
    }

    /// Answer a compliance request for an indicator
    pub fn for_indicator(
        &self,
        indicator: &Indicator,
        request: &ComplianceRequest,
        submissions: &[Submission],
    ) -> Result<ComplianceReport> {
        let frequency = request.reporting_frequency.unwrap_or(indicator.frequency);
        self.calculate(frequency, request.start_date, request.end_date, submissions)
    }

    /// Compute compliance over `[start, end]`
    pub fn calculate(
        &self,
        frequency: Frequency,
        start: NaiveDate,
        end: NaiveDate,
        submissions: &[Submission],
    ) -> Result<ComplianceReport> {
        let periods = cadence_periods(frequency, start, end)?;

        let overall = self.evaluate_periods(&periods, submissions.iter());
        let stats = ComplianceStats::tally(&overall);

        let mut grouped: BTreeMap<&str, Vec<&Submission>> = BTreeMap::new();
        for submission in submissions {
            if let Some(key) = submission.disaggregation_key.as_deref() {
                grouped.entry(key).or_default().push(submission);
            }
        }

        let by_disaggregation: BTreeMap<String, ComplianceStats> = grouped
            .into_iter()
            .map(|(key, group)| {
                let statuses = self.evaluate_periods(&periods, group.into_iter());
                (key.to_string(), ComplianceStats::tally(&statuses))
            })
            .collect();

        debug!(
            frequency = %frequency,
            %start,
            %end,
            expected = stats.expected_reports,
            received = stats.received_reports,
            groups = by_disaggregation.len(),
            "Computed reporting compliance"
        );

        Ok(ComplianceReport {
            frequency,
            start_date: start,
            end_date: end,
            grace_days: self.grace_days,
            stats,
            periods: overall,
            by_disaggregation,
        })
    }

    fn evaluate_periods<'a>(
        &self,
        periods: &[Period],
        submissions: impl Iterator<Item = &'a Submission>,
    ) -> Vec<PeriodCompliance> {
        let mut counts = vec![0usize; periods.len()];
        let mut first_entered: Vec<Option<NaiveDate>> = vec![None; periods.len()];

        for submission in submissions {
            let Some(index) = locate(periods, submission.reported_at) else {
                continue;
            };
            counts[index] += 1;
            let entered = submission.effective_submitted_at();
            first_entered[index] = Some(first_entered[index].map_or(entered, |d| d.min(entered)));
        }

        periods
            .iter()
            .zip(counts)
            .zip(first_entered)
            .map(|((period, count), first)| {
                let status = match first {
                    None => ReportStatus::Missing,
                    Some(entered) if self.is_on_time(period, entered) => ReportStatus::OnTime,
                    Some(_) => ReportStatus::Late,
                };
                PeriodCompliance {
                    period: period.clone(),
                    status,
                    submissions: count,
                    first_submitted_at: first,
                }
            })
            .collect()
    }

    fn is_on_time(&self, period: &Period, entered: NaiveDate) -> bool {
        let deadline = period
            .end_date
            .checked_add_signed(Duration::days(self.grace_days as i64))
            .unwrap_or(NaiveDate::MAX);
        entered <= deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_full_compliance() {
        let submissions = vec![
            Submission::numeric(date(1, 10), 1.0),
            Submission::numeric(date(2, 10), 1.0),
        ];
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Monthly, date(1, 1), date(2, 29), &submissions)
            .unwrap();
        assert_eq!(report.stats.expected_reports, 2);
        assert_eq!(report.stats.received_reports, 2);
        assert_eq!(report.stats.compliance_rate, 1.0);
        assert!(report.by_disaggregation.is_empty());
    }

    #[test]
    fn test_missing_period() {
        let submissions = vec![
            Submission::numeric(date(1, 5), 1.0),
            Submission::numeric(date(3, 20), 1.0),
        ];
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Monthly, date(1, 1), date(3, 31), &submissions)
            .unwrap();
        assert_eq!(report.stats.expected_reports, 3);
        assert_eq!(report.stats.received_reports, 2);
        assert_eq!(report.stats.missing_reports, 1);
        assert!((report.stats.compliance_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.periods[1].status, ReportStatus::Missing);
    }

    #[test]
    fn test_late_versus_on_time_with_grace() {
        let submissions = vec![
            Submission::numeric(date(1, 31), 1.0).with_submitted_at(date(2, 3)),
            Submission::numeric(date(2, 15), 1.0).with_submitted_at(date(3, 10)),
        ];

        let strict = ComplianceCalculator::new(0)
            .calculate(Frequency::Monthly, date(1, 1), date(2, 29), &submissions)
            .unwrap();
        assert_eq!(strict.stats.on_time_reports, 0);
        assert_eq!(strict.stats.late_reports, 2);
        assert_eq!(strict.stats.compliance_rate, 1.0);

        let lenient = ComplianceCalculator::new(5)
            .calculate(Frequency::Monthly, date(1, 1), date(2, 29), &submissions)
            .unwrap();
        assert_eq!(lenient.stats.on_time_reports, 1);
        assert_eq!(lenient.stats.late_reports, 1);
        assert_eq!(lenient.periods[0].status, ReportStatus::OnTime);
    }

    #[test]
    fn test_earliest_entry_decides_timeliness() {
        let submissions = vec![
            Submission::numeric(date(1, 20), 1.0).with_submitted_at(date(2, 20)),
            Submission::numeric(date(1, 25), 1.0).with_submitted_at(date(1, 26)),
        ];
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Monthly, date(1, 1), date(1, 31), &submissions)
            .unwrap();
        assert_eq!(report.periods[0].status, ReportStatus::OnTime);
        assert_eq!(report.periods[0].submissions, 2);
        assert_eq!(report.periods[0].first_submitted_at, Some(date(1, 26)));
    }

    #[test]
    fn test_submissions_outside_range_ignored() {
        let submissions = vec![
            Submission::numeric(date(1, 1), 1.0),
            Submission::numeric(date(5, 1), 1.0),
        ];
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Weekly, date(2, 1), date(2, 14), &submissions)
            .unwrap();
        assert_eq!(report.stats.expected_reports, 2);
        assert_eq!(report.stats.received_reports, 0);
        assert_eq!(report.stats.compliance_rate, 0.0);
    }

    #[test]
    fn test_zero_expected_is_full_compliance() {
        let stats = ComplianceStats::tally(&[]);
        assert_eq!(stats.expected_reports, 0);
        assert_eq!(stats.compliance_rate, 1.0);
    }

    #[test]
    fn test_disaggregation_and_ranking() {
        let submissions = vec![
            Submission::numeric(date(1, 3), 1.0).with_disaggregation_key("north"),
            Submission::numeric(date(2, 3), 1.0).with_disaggregation_key("north"),
            Submission::numeric(date(1, 9), 1.0).with_disaggregation_key("south"),
            Submission::numeric(date(2, 9), 1.0),
        ];
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Monthly, date(1, 1), date(2, 29), &submissions)
            .unwrap();

        assert_eq!(report.stats.received_reports, 2);
        assert_eq!(report.by_disaggregation.len(), 2);
        assert_eq!(report.by_disaggregation["north"].compliance_rate, 1.0);
        assert_eq!(report.by_disaggregation["south"].compliance_rate, 0.5);

        let ranked = report.ranked_by_compliance();
        assert_eq!(ranked[0].0, "north");
        assert_eq!(ranked[1].0, "south");
    }

    #[test]
    fn test_request_frequency_override() {
        let indicator = Indicator::new("Visits", indicator_types::IndicatorType::Number, Frequency::Monthly);
        let request = ComplianceRequest {
            start_date: date(1, 1),
            end_date: date(1, 14),
            reporting_frequency: Some(Frequency::Weekly),
        };
        let report = ComplianceCalculator::default()
            .for_indicator(&indicator, &request, &[])
            .unwrap();
        assert_eq!(report.frequency, Frequency::Weekly);
        assert_eq!(report.stats.expected_reports, 2);
        assert_eq!(report.stats.missing_reports, 2);
    }

    #[test]
    fn test_inverted_range_is_error() {
        assert!(ComplianceCalculator::default()
            .calculate(Frequency::Daily, date(3, 1), date(1, 1), &[])
            .is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let report = ComplianceCalculator::default()
            .calculate(Frequency::Monthly, date(1, 1), date(1, 31), &[])
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["expectedReports"], 1);
        assert_eq!(json["missingReports"], 1);
        assert_eq!(json["frequency"], "MONTHLY");
        assert_eq!(json["periods"][0]["status"], "MISSING");
        assert_eq!(json["periods"][0]["startDate"], "2024-01-01");
        assert!(json["byDisaggregation"].as_object().unwrap().is_empty());
    }
}
