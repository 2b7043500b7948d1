//! Evaluate command - flag anomalous submissions

use crate::{
    commands::run_per_dataset,
    input::{load_datasets, Dataset},
    output::{flag, Formatter, Section},
    CliResult,
};
use analytics::{AnomalyEvaluator, RecomputeSummary, SubmissionSeries};
use clap::{Args, ValueEnum};
use indicator_config::AnalyticsConfig;
use indicator_types::{BackfillPolicy, Indicator, Submission};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// How submissions are fed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EvaluateMode {
    /// Replay submissions one by one in file order
    #[default]
    Insert,
    /// Re-run the whole series in date order
    Recompute,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Dataset file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Evaluation mode
    #[arg(long, value_enum, default_value_t = EvaluateMode::Insert)]
    pub mode: EvaluateMode,

    /// Only list flagged submissions
    #[arg(long)]
    pub anomalies_only: bool,

    /// Write the evaluated datasets back as JSON
    #[arg(long, value_name = "FILE")]
    pub write: Option<PathBuf>,
}

/// Evaluated submissions of one indicator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub indicator: Indicator,
    pub summary: RecomputeSummary,
    pub submissions: Vec<Submission>,
}

impl EvaluateArgs {
    pub async fn execute(&self, config: &AnalyticsConfig, formatter: &dyn Formatter) -> CliResult<()> {
        let evaluations = self.evaluate(config).await?;

        if let Some(path) = &self.write {
            let datasets: Vec<Dataset> = evaluations
                .iter()
                .map(|e| Dataset {
                    indicator: e.indicator.clone(),
                    submissions: e.submissions.clone(),
                })
                .collect();
            std::fs::write(path, serde_json::to_string_pretty(&datasets)?)?;
            info!(path = %path.display(), "Wrote evaluated datasets");
        }

        let sections = evaluations
            .iter()
            .map(|e| self.section(e))
            .collect::<CliResult<Vec<_>>>()?;
        println!("{}", formatter.render(&sections)?);
        Ok(())
    }

    /// Evaluate every dataset in the input file
    pub async fn evaluate(&self, config: &AnalyticsConfig) -> CliResult<Vec<Evaluation>> {
        let datasets = load_datasets(&self.input)?;
        let mode = self.mode;
        let policy = config.anomaly.backfill_policy;
        run_per_dataset(datasets, move |dataset| evaluate_dataset(dataset, mode, policy)).await
    }

    fn section(&self, evaluation: &Evaluation) -> CliResult<Section> {
        let summary = evaluation.summary;
        let title = format!(
            "{} ({}) evaluated {}, flagged {}, changed {}",
            evaluation.indicator.name,
            evaluation.indicator.indicator_type,
            summary.evaluated,
            summary.flagged,
            summary.changed
        );
        let mut section = Section::new(
            title,
            vec!["reported", "value", "anomaly", "reason"],
            serde_json::to_value(evaluation)?,
        );

        for submission in &evaluation.submissions {
            if self.anomalies_only && !submission.is_anomaly {
                continue;
            }
            section.row(vec![
                submission.reported_at.to_string(),
                submission.value.clone(),
                flag(submission.is_anomaly),
                submission.anomaly_reason.clone().unwrap_or_default(),
            ]);
        }

        Ok(section)
    }
}

/// Evaluate one dataset
pub fn evaluate_dataset(
    dataset: Dataset,
    mode: EvaluateMode,
    policy: BackfillPolicy,
) -> CliResult<Evaluation> {
    let evaluator = AnomalyEvaluator::new(&dataset.indicator)?.with_backfill_policy(policy);
    let before = dataset.submissions.clone();

    let series = match mode {
        EvaluateMode::Insert => {
            let mut series = SubmissionSeries::new();
            for submission in dataset.submissions {
                evaluator.evaluate_insert(&mut series, submission);
            }
            series
        }
        EvaluateMode::Recompute => {
            let mut series = SubmissionSeries::from_submissions(dataset.submissions);
            evaluator.recompute(&mut series);
            series
        }
    };

    let submissions = series.into_submissions();
    let summary = RecomputeSummary {
        evaluated: submissions.len(),
        flagged: submissions.iter().filter(|s| s.is_anomaly).count(),
        changed: submissions
            .iter()
            .filter(|after| {
                before.iter().find(|b| b.id == after.id).map_or(true, |b| {
                    b.is_anomaly != after.is_anomaly || b.anomaly_reason != after.anomaly_reason
                })
            })
            .count(),
    };

    Ok(Evaluation {
        indicator: dataset.indicator,
        summary,
        submissions,
    })
}
