//! Forecast command - project numeric indicators forward

use crate::{
    commands::run_per_dataset,
    input::{load_datasets, Dataset},
    output::{Formatter, Section},
    CliError, CliResult,
};
use analytics::{forecast_with_settings, ForecastPoint, SubmissionSeries};
use clap::Args;
use indicator_config::AnalyticsConfig;
use indicator_types::{ForecastSettings, Indicator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct ForecastArgs {
    /// Dataset file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Number of projected points (defaults to the configured value)
    #[arg(short, long)]
    pub periods: Option<usize>,

    /// Days between projected points (defaults to the configured value)
    #[arg(long)]
    pub step_days: Option<u32>,
}

/// Forecast of one indicator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorForecast {
    pub indicator: Indicator,
    pub points: Vec<ForecastPoint>,
}

impl ForecastArgs {
    pub async fn execute(&self, config: &AnalyticsConfig, formatter: &dyn Formatter) -> CliResult<()> {
        let forecasts = self.forecast(config).await?;
        let sections = forecasts
            .iter()
            .map(section)
            .collect::<CliResult<Vec<_>>>()?;
        println!("{}", formatter.render(&sections)?);
        Ok(())
    }

    fn settings(&self, config: &AnalyticsConfig) -> CliResult<ForecastSettings> {
        let settings = ForecastSettings {
            periods: self.periods.unwrap_or(config.forecast.periods),
            step_days: self.step_days.unwrap_or(config.forecast.step_days),
        };
        if settings.periods == 0 || settings.step_days == 0 {
            return Err(CliError::InvalidInput(
                "--periods and --step-days must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Forecast every numeric dataset in the input file
    pub async fn forecast(&self, config: &AnalyticsConfig) -> CliResult<Vec<IndicatorForecast>> {
        let settings = self.settings(config)?;
        let datasets: Vec<Dataset> = load_datasets(&self.input)?
            .into_iter()
            .filter(|d| {
                let numeric = d.indicator.indicator_type.is_numeric();
                if !numeric {
                    warn!(
                        indicator = %d.indicator.name,
                        indicator_type = %d.indicator.indicator_type,
                        "Skipping non-numeric indicator"
                    );
                }
                numeric
            })
            .collect();

        run_per_dataset(datasets, move |dataset| {
            let series = SubmissionSeries::from_submissions(dataset.submissions);
            let points = forecast_with_settings(&series.dated_values(), &settings);
            Ok(IndicatorForecast {
                indicator: dataset.indicator,
                points,
            })
        })
        .await
    }
}

fn section(forecast: &IndicatorForecast) -> CliResult<Section> {
    let mut section = Section::new(
        format!("{} forecast", forecast.indicator.name),
        vec!["date", "actual", "forecast", "projected"],
        serde_json::to_value(forecast)?,
    );
    for point in &forecast.points {
        section.row(vec![
            point.date.to_string(),
            point.actual.map(|v| v.to_string()).unwrap_or_default(),
            format!("{:.2}", point.forecast),
            if point.is_forecast { "yes" } else { "no" }.to_string(),
        ]);
    }
    Ok(section)
}
