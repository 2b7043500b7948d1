//! Category Distribution
//!
//! Buckets a categorical indicator's submissions into calendar periods and
//! counts how often each category was selected.
//!
//! Percentages are relative to the number of submissions in the period, not
//! to the number of selections. When an indicator allows multiple categories
//! per submission the percentages of one period can therefore add up to more
//! than 100%. Ids that are not defined on the indicator are kept and shown
//! under their raw id.

use chrono::NaiveDate;
use indicator_types::{Indicator, IndicatorError, IndicatorType, Submission};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::errors::{AnalyticsError, Result};
use crate::periods::{calendar_periods, locate, GroupBy};
use crate::statistics::round2;

/// Count and share of one category in a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub count: usize,
    /// `count / totalSubmissions * 100`, two decimals
    pub percentage: f64,
    /// False when the id is not defined on the indicator
    pub defined: bool,
}

/// Distribution for one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPeriod {
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category_distribution: BTreeMap<String, CategoryShare>,
    pub total_submissions: usize,
}

/// Query parameters of a category time series request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTimeSeriesRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_by: GroupBy,
}

/// Aggregator bound to one categorical indicator
#[derive(Debug, Clone)]
pub struct CategoryAggregator<'a> {
    indicator: &'a Indicator,
}

impl<'a> CategoryAggregator<'a> {
    /// Create aggregator; the indicator must be categorical
    pub fn new(indicator: &'a Indicator) -> Result<Self> {
        if indicator.indicator_type != IndicatorType::Categorical {
            return Err(AnalyticsError::UnsupportedIndicator(format!(
                "category distribution needs a CATEGORICAL indicator, got {}",
                indicator.indicator_type
            )));
        }
        indicator.validate()?;
        Ok(Self { indicator })
    }

    /// Answer a category time series request
    pub fn time_series(
        &self,
        request: &CategoryTimeSeriesRequest,
        submissions: &[Submission],
    ) -> Result<Vec<CategoryPeriod>> {
        self.aggregate(submissions, request.start_date, request.end_date, request.group_by)
    }

    /// Per-period distributions over `[start, end]`; empty periods included
    pub fn aggregate(
        &self,
        submissions: &[Submission],
        start: NaiveDate,
        end: NaiveDate,
        group_by: GroupBy,
    ) -> Result<Vec<CategoryPeriod>> {
        let periods = calendar_periods(group_by, start, end)?;

        let mut totals = vec![0usize; periods.len()];
        let mut counts: Vec<BTreeMap<String, usize>> = vec![BTreeMap::new(); periods.len()];
        let mut unknown: BTreeSet<String> = BTreeSet::new();

        for submission in submissions {
            let Some(index) = locate(&periods, submission.reported_at) else {
                continue;
            };
            totals[index] += 1;
            for id in submission.category_ids() {
                if self.indicator.category(id).is_none() && unknown.insert(id.to_string()) {
                    warn!(
                        indicator_id = %self.indicator.id,
                        category_id = id,
                        "Submission references an undefined category"
                    );
                }
                *counts[index].entry(id.to_string()).or_insert(0) += 1;
            }
        }

        let buckets: Vec<CategoryPeriod> = periods
            .into_iter()
            .zip(totals)
            .zip(counts)
            .map(|((period, total), period_counts)| CategoryPeriod {
                period: period.label,
                start_date: period.start_date,
                end_date: period.end_date,
                category_distribution: self.distribution(&period_counts, total),
                total_submissions: total,
            })
            .collect();

        debug!(
            indicator_id = %self.indicator.id,
            group_by = %group_by,
            periods = buckets.len(),
            unknown_categories = unknown.len(),
            "Aggregated category distribution"
        );

        Ok(buckets)
    }

    /// Distribution across all buckets combined
    pub fn overall_distribution(&self, periods: &[CategoryPeriod]) -> BTreeMap<String, CategoryShare> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0;
        for period in periods {
            total += period.total_submissions;
            for (id, share) in &period.category_distribution {
                *counts.entry(id.clone()).or_insert(0) += share.count;
            }
        }
        self.distribution(&counts, total)
    }

    fn distribution(
        &self,
        counts: &BTreeMap<String, usize>,
        total: usize,
    ) -> BTreeMap<String, CategoryShare> {
        let mut distribution = BTreeMap::new();

        for category in &self.indicator.categories {
            let count = counts.get(&category.id).copied().unwrap_or(0);
            distribution.insert(
                category.id.clone(),
                CategoryShare {
                    label: category.label.clone(),
                    color: category.color.clone(),
                    count,
                    percentage: share(count, total),
                    defined: true,
                },
            );
        }

        for (id, &count) in counts {
            if !distribution.contains_key(id) {
                distribution.insert(
                    id.clone(),
                    CategoryShare {
                        label: id.clone(),
                        color: None,
                        count,
                        percentage: share(count, total),
                        defined: false,
                    },
                );
            }
        }

        distribution
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(count as f64 / total as f64 * 100.0)
    }
}

/// Validate a raw categorical value at data entry
///
/// Returns the selected ids in order. Unlike aggregation, this rejects
/// undefined ids and selections that break the indicator's category rules.
pub fn parse_selection(indicator: &Indicator, raw: &str) -> std::result::Result<Vec<String>, IndicatorError> {
    let probe = Submission::new(NaiveDate::MIN, raw);
    let ids = probe.category_ids();

    if ids.is_empty() {
        return Err(IndicatorError::InvalidSelection(
            "at least one category is required".to_string(),
        ));
    }

    if let Some(id) = ids.iter().find(|id| indicator.category(id).is_none()) {
        return Err(IndicatorError::InvalidSelection(format!(
            "unknown category '{}'",
            id
        )));
    }

    let config = &indicator.category_config;
    if !config.allow_multiple && ids.len() > 1 {
        return Err(IndicatorError::InvalidSelection(
            "only one category may be selected".to_string(),
        ));
    }

    if let Some(max) = config.max_selections {
        if ids.len() > max {
            return Err(IndicatorError::InvalidSelection(format!(
                "{} categories selected, at most {} allowed",
                ids.len(),
                max
            )));
        }
    }

    Ok(ids.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicator_types::{CategoryConfig, CategoryDefinition, Frequency};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn indicator(allow_multiple: bool) -> Indicator {
        Indicator::new("Water source", IndicatorType::Categorical, Frequency::Monthly)
            .with_categories(vec![
                CategoryDefinition::new("well", "Well").with_color("#1f77b4"),
                CategoryDefinition::new("river", "River"),
                CategoryDefinition::new("tap", "Tap"),
            ])
            .with_category_config(CategoryConfig {
                allow_multiple,
                max_selections: if allow_multiple { Some(2) } else { None },
            })
    }

    #[test]
    fn test_rejects_non_categorical() {
        let numeric = Indicator::new("Visits", IndicatorType::Number, Frequency::Monthly);
        assert!(CategoryAggregator::new(&numeric).is_err());
    }

    #[test]
    fn test_single_select_sums_to_hundred() {
        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![
            Submission::new(date(1, 2), "well"),
            Submission::new(date(1, 9), "river"),
            Submission::new(date(1, 20), "well"),
        ];
        let periods = aggregator
            .aggregate(&submissions, date(1, 1), date(1, 31), GroupBy::Month)
            .unwrap();
        assert_eq!(periods.len(), 1);

        let january = &periods[0];
        assert_eq!(january.total_submissions, 3);
        assert_eq!(january.category_distribution["well"].count, 2);
        assert_eq!(january.category_distribution["well"].color.as_deref(), Some("#1f77b4"));
        assert_eq!(january.category_distribution["tap"].count, 0);
        let sum: f64 = january.category_distribution.values().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.02);
    }

    #[test]
    fn test_multi_select_can_exceed_hundred() {
        let indicator = indicator(true);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![
            Submission::new(date(1, 2), "well,river"),
            Submission::new(date(1, 3), "well"),
        ];
        let periods = aggregator
            .aggregate(&submissions, date(1, 1), date(1, 31), GroupBy::Month)
            .unwrap();
        let distribution = &periods[0].category_distribution;
        assert_eq!(distribution["well"].percentage, 100.0);
        assert_eq!(distribution["river"].percentage, 50.0);
        let sum: f64 = distribution.values().map(|s| s.percentage).sum();
        assert!(sum > 100.0);
    }

    #[test]
    fn test_empty_periods_emitted() {
        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![Submission::new(date(3, 5), "tap")];
        let periods = aggregator
            .aggregate(&submissions, date(1, 1), date(3, 31), GroupBy::Month)
            .unwrap();
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].total_submissions, 0);
        assert_eq!(periods[0].category_distribution["tap"].percentage, 0.0);
        assert_eq!(periods[2].period, "2024-03");
        assert_eq!(periods[2].category_distribution["tap"].count, 1);
    }

    #[test]
    fn test_unknown_ids_kept_with_raw_label() {
        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![
            Submission::new(date(1, 2), "lake"),
            Submission::new(date(1, 4), "well"),
        ];
        let periods = aggregator
            .aggregate(&submissions, date(1, 1), date(1, 31), GroupBy::Month)
            .unwrap();
        let lake = &periods[0].category_distribution["lake"];
        assert_eq!(lake.label, "lake");
        assert!(!lake.defined);
        assert_eq!(lake.count, 1);
        assert_eq!(lake.percentage, 50.0);
    }

    #[test]
    fn test_submissions_outside_range_ignored() {
        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![
            Submission::new(date(1, 2), "well"),
            Submission::new(date(6, 2), "well"),
        ];
        let periods = aggregator
            .aggregate(&submissions, date(2, 1), date(2, 29), GroupBy::Week)
            .unwrap();
        assert!(periods.iter().all(|p| p.total_submissions == 0));
    }

    #[test]
    fn test_overall_distribution() {
        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let submissions = vec![
            Submission::new(date(1, 2), "well"),
            Submission::new(date(2, 2), "river"),
            Submission::new(date(2, 3), "river"),
            Submission::new(date(3, 3), "river"),
        ];
        let periods = aggregator
            .aggregate(&submissions, date(1, 1), date(3, 31), GroupBy::Month)
            .unwrap();
        let overall = aggregator.overall_distribution(&periods);
        assert_eq!(overall["river"].count, 3);
        assert_eq!(overall["river"].percentage, 75.0);
        assert_eq!(overall["well"].percentage, 25.0);
    }

    #[test]
    fn test_time_series_request_json() {
        let request: CategoryTimeSeriesRequest = serde_json::from_str(
            r#"{"startDate":"2024-01-01","endDate":"2024-03-31","groupBy":"quarter"}"#,
        )
        .unwrap();
        assert_eq!(request.group_by, GroupBy::Quarter);

        let indicator = indicator(false);
        let aggregator = CategoryAggregator::new(&indicator).unwrap();
        let periods = aggregator.time_series(&request, &[]).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].period, "2024-Q1");

        let json = serde_json::to_value(&periods[0]).unwrap();
        assert_eq!(json["totalSubmissions"], 0);
        assert_eq!(json["categoryDistribution"]["well"]["label"], "Well");
    }

    #[test]
    fn test_parse_selection() {
        let single = indicator(false);
        assert_eq!(parse_selection(&single, " well ").unwrap(), vec!["well"]);
        assert!(parse_selection(&single, "well,river").is_err());
        assert!(parse_selection(&single, "lake").is_err());
        assert!(parse_selection(&single, " , ").is_err());

        let multi = indicator(true);
        assert_eq!(parse_selection(&multi, "well,river").unwrap(), vec!["well", "river"]);
        assert!(parse_selection(&multi, "well,river,tap").is_err());
    }
}
