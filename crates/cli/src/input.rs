//! Dataset files
//!
//! A dataset is one indicator with its submissions. Files hold either a
//! single dataset object or an array of them.

use crate::{CliError, CliResult};
use indicator_types::{Indicator, Submission};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// An indicator snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub indicator: Indicator,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Many(Vec<Dataset>),
    One(Box<Dataset>),
}

/// Read and validate datasets from a JSON file
pub fn load_datasets(path: &Path) -> CliResult<Vec<Dataset>> {
    let text = std::fs::read_to_string(path)?;
    let datasets = parse_datasets(&text)?;
    debug!(path = %path.display(), datasets = datasets.len(), "Loaded input");
    Ok(datasets)
}

/// Parse datasets from JSON text
pub fn parse_datasets(text: &str) -> CliResult<Vec<Dataset>> {
    let datasets = match serde_json::from_str::<DatasetFile>(text) {
        Ok(DatasetFile::Many(datasets)) => datasets,
        Ok(DatasetFile::One(dataset)) => vec![*dataset],
        Err(e) => {
            return Err(CliError::InvalidInput(format!(
                "expected a dataset object or an array of datasets: {}",
                e
            )))
        }
    };

    if datasets.is_empty() {
        return Err(CliError::InvalidInput("input contains no datasets".to_string()));
    }

    for dataset in &datasets {
        dataset.indicator.validate().map_err(|e| {
            CliError::InvalidInput(format!("indicator '{}': {}", dataset.indicator.name, e))
        })?;
    }

    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicator_types::IndicatorType;
    use std::io::Write;

    const SINGLE: &str = r#"{
        "indicator": {"name": "Visits", "type": "NUMBER", "frequency": "WEEKLY"},
        "submissions": [
            {"reportedAt": "2024-01-01", "value": "12"},
            {"reportedAt": "2024-01-08", "value": "14", "disaggregationKey": "north"}
        ]
    }"#;

    #[test]
    fn test_single_dataset_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SINGLE.as_bytes()).unwrap();

        let datasets = load_datasets(file.path()).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].indicator.indicator_type, IndicatorType::Number);
        assert_eq!(datasets[0].submissions.len(), 2);
        assert_eq!(
            datasets[0].submissions[1].disaggregation_key.as_deref(),
            Some("north")
        );
    }

    #[test]
    fn test_array_file() {
        let text = format!("[{}, {}]", SINGLE, SINGLE);
        let datasets = parse_datasets(&text).unwrap();
        assert_eq!(datasets.len(), 2);
        assert_ne!(datasets[0].indicator.id, datasets[1].indicator.id);
    }

    #[test]
    fn test_rejects_invalid_indicator() {
        let text = r#"{"indicator": {"type": "NUMBER", "frequency": "MONTHLY",
            "minExpected": 10, "maxExpected": 1}}"#;
        assert!(matches!(parse_datasets(text), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_garbage_and_empty() {
        assert!(parse_datasets("{\"foo\": 1}").is_err());
        assert!(parse_datasets("[]").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_datasets(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
