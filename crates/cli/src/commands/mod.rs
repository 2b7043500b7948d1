//! CLI command implementations

pub mod categories;
pub mod compliance;
pub mod evaluate;
pub mod forecast;

pub use categories::CategoriesArgs;
pub use compliance::ComplianceArgs;
pub use evaluate::{EvaluateArgs, EvaluateMode};
pub use forecast::ForecastArgs;

use crate::{input::Dataset, CliError, CliResult};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Run `job` once per dataset on the blocking pool
///
/// Indicators are independent, so each gets its own task. Results come back
/// in input order; the first failure aborts the command.
pub async fn run_per_dataset<T, F>(datasets: Vec<Dataset>, job: F) -> CliResult<Vec<T>>
where
    T: Send + 'static,
    F: Fn(Dataset) -> CliResult<T> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let mut tasks = JoinSet::new();

    for (index, dataset) in datasets.into_iter().enumerate() {
        let job = Arc::clone(&job);
        tasks.spawn_blocking(move || (index, job(dataset)));
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.map_err(|e| CliError::Task(e.to_string()))?;
        results.push((index, result?));
    }

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, value)| value).collect())
}
