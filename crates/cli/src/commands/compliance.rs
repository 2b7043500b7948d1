//! Compliance command - expected vs received reports

use crate::{
    commands::run_per_dataset,
    input::load_datasets,
    output::{Formatter, Section},
    CliResult,
};
use analytics::{ComplianceCalculator, ComplianceReport, ComplianceRequest};
use chrono::NaiveDate;
use clap::Args;
use indicator_config::AnalyticsConfig;
use indicator_types::{Frequency, Indicator};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ComplianceArgs {
    /// Dataset file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Reporting frequency; defaults to each indicator's own
    #[arg(short, long)]
    pub frequency: Option<Frequency>,

    /// Days after a period ends during which a report still counts as on time
    #[arg(long)]
    pub grace_days: Option<u32>,
}

/// Compliance report of one indicator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorCompliance {
    pub indicator: Indicator,
    pub report: ComplianceReport,
}

impl ComplianceArgs {
    pub async fn execute(&self, config: &AnalyticsConfig, formatter: &dyn Formatter) -> CliResult<()> {
        let reports = self.compliance(config).await?;
        let mut sections = Vec::new();
        for report in &reports {
            sections.extend(sections_for(report)?);
        }
        println!("{}", formatter.render(&sections)?);
        Ok(())
    }

    /// Compliance of every dataset in the input file
    pub async fn compliance(&self, config: &AnalyticsConfig) -> CliResult<Vec<IndicatorCompliance>> {
        let datasets = load_datasets(&self.input)?;
        let calculator =
            ComplianceCalculator::new(self.grace_days.unwrap_or(config.compliance.grace_days));
        let request = ComplianceRequest {
            start_date: self.start,
            end_date: self.end,
            reporting_frequency: self.frequency,
        };

        run_per_dataset(datasets, move |dataset| {
            let report = calculator.for_indicator(&dataset.indicator, &request, &dataset.submissions)?;
            Ok(IndicatorCompliance {
                indicator: dataset.indicator,
                report,
            })
        })
        .await
    }
}

fn sections_for(compliance: &IndicatorCompliance) -> CliResult<Vec<Section>> {
    let report = &compliance.report;
    let stats = &report.stats;
    let title = format!(
        "{} ({}) compliance {:.1}%: {} expected, {} received, {} on time, {} late, {} missing",
        compliance.indicator.name,
        report.frequency,
        stats.compliance_rate * 100.0,
        stats.expected_reports,
        stats.received_reports,
        stats.on_time_reports,
        stats.late_reports,
        stats.missing_reports
    );

    let mut periods = Section::new(
        title,
        vec!["start", "end", "status", "submissions", "first submitted"],
        serde_json::to_value(compliance)?,
    );
    for period in &report.periods {
        periods.row(vec![
            period.period.start_date.to_string(),
            period.period.end_date.to_string(),
            serde_json::to_value(period.status)?
                .as_str()
                .unwrap_or_default()
                .to_string(),
            period.submissions.to_string(),
            period
                .first_submitted_at
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ]);
    }

    let mut sections = vec![periods];
    if !report.by_disaggregation.is_empty() {
        let mut ranking = Section::new(
            format!("{} by disaggregation", compliance.indicator.name),
            vec!["key", "rate", "received", "expected", "late"],
            serde_json::to_value(&report.by_disaggregation)?,
        );
        for (key, stats) in report.ranked_by_compliance() {
            ranking.row(vec![
                key.to_string(),
                format!("{:.1}%", stats.compliance_rate * 100.0),
                stats.received_reports.to_string(),
                stats.expected_reports.to_string(),
                stats.late_reports.to_string(),
            ]);
        }
        sections.push(ranking);
    }

    Ok(sections)
}
