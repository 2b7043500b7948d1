//! Categories command - category distribution over calendar periods

use crate::{
    commands::run_per_dataset,
    input::{load_datasets, Dataset},
    output::{Formatter, Section},
    CliResult,
};
use analytics::{CategoryAggregator, CategoryPeriod, CategoryShare, CategoryTimeSeriesRequest, GroupBy};
use chrono::NaiveDate;
use clap::Args;
use indicator_config::AnalyticsConfig;
use indicator_types::{Indicator, IndicatorType};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct CategoriesArgs {
    /// Dataset file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Bucket size: day, week, month, quarter or year
    #[arg(short, long, default_value = "month")]
    pub group_by: GroupBy,
}

/// Category time series of one indicator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySeries {
    pub indicator: Indicator,
    pub periods: Vec<CategoryPeriod>,
    pub overall: BTreeMap<String, CategoryShare>,
}

impl CategoriesArgs {
    pub async fn execute(&self, _config: &AnalyticsConfig, formatter: &dyn Formatter) -> CliResult<()> {
        let series = self.categories().await?;
        let sections = series
            .iter()
            .map(section)
            .collect::<CliResult<Vec<_>>>()?;
        println!("{}", formatter.render(&sections)?);
        Ok(())
    }

    /// Category series of every categorical dataset in the input file
    pub async fn categories(&self) -> CliResult<Vec<CategorySeries>> {
        let datasets: Vec<Dataset> = load_datasets(&self.input)?
            .into_iter()
            .filter(|d| {
                let categorical = d.indicator.indicator_type == IndicatorType::Categorical;
                if !categorical {
                    warn!(
                        indicator = %d.indicator.name,
                        indicator_type = %d.indicator.indicator_type,
                        "Skipping non-categorical indicator"
                    );
                }
                categorical
            })
            .collect();

        let request = CategoryTimeSeriesRequest {
            start_date: self.start,
            end_date: self.end,
            group_by: self.group_by,
        };

        run_per_dataset(datasets, move |dataset| {
            let aggregator = CategoryAggregator::new(&dataset.indicator)?;
            let periods = aggregator.time_series(&request, &dataset.submissions)?;
            let overall = aggregator.overall_distribution(&periods);
            Ok(CategorySeries {
                indicator: dataset.indicator,
                periods,
                overall,
            })
        })
        .await
    }
}

fn describe(distribution: &BTreeMap<String, CategoryShare>) -> String {
    distribution
        .values()
        .filter(|share| share.count > 0)
        .map(|share| format!("{} {} ({:.2}%)", share.label, share.count, share.percentage))
        .collect::<Vec<_>>()
        .join(", ")
}

fn section(series: &CategorySeries) -> CliResult<Section> {
    let mut section = Section::new(
        format!("{} categories: {}", series.indicator.name, describe(&series.overall)),
        vec!["period", "start", "end", "submissions", "distribution"],
        serde_json::to_value(series)?,
    );
    for period in &series.periods {
        section.row(vec![
            period.period.clone(),
            period.start_date.to_string(),
            period.end_date.to_string(),
            period.total_submissions.to_string(),
            describe(&period.category_distribution),
        ]);
    }
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INPUT: &str = r#"{
        "indicator": {
            "name": "Water source", "type": "CATEGORICAL", "frequency": "MONTHLY",
            "categories": [{"id": "well", "label": "Well"}, {"id": "tap", "label": "Tap"}],
            "categoryConfig": {"allowMultiple": true}
        },
        "submissions": [
            {"reportedAt": "2024-01-05", "value": "well,tap"},
            {"reportedAt": "2024-01-20", "value": "well"},
            {"reportedAt": "2024-02-02", "value": "river"}
        ]
    }"#;

    #[tokio::test]
    async fn test_monthly_categories() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INPUT.as_bytes()).unwrap();
        let args = CategoriesArgs {
            input: file.path().to_path_buf(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            group_by: GroupBy::Month,
        };

        let series = args.categories().await.unwrap();
        assert_eq!(series.len(), 1);
        let periods = &series[0].periods;
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].category_distribution["well"].percentage, 100.0);
        assert_eq!(periods[0].category_distribution["tap"].percentage, 50.0);
        assert_eq!(periods[1].category_distribution["river"].label, "river");
        assert_eq!(series[0].overall["well"].count, 2);

        let section = section(&series[0]).unwrap();
        assert_eq!(section.rows[0][4], "Tap 1 (50.00%), Well 2 (100.00%)");
        assert_eq!(section.rows[2][4], "");
    }
}
