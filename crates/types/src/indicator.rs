//! Indicator definitions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::anomaly::AnomalyConfig;
use crate::errors::{IndicatorError, Result};

/// Kind of value an indicator collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorType {
    Number,
    Percentage,
    Currency,
    Boolean,
    Text,
    Categorical,
}

impl IndicatorType {
    /// Whether values of this type are decimal numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Percentage | Self::Currency)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "NUMBER",
            Self::Percentage => "PERCENTAGE",
            Self::Currency => "CURRENCY",
            Self::Boolean => "BOOLEAN",
            Self::Text => "TEXT",
            Self::Categorical => "CATEGORICAL",
        };
        f.write_str(name)
    }
}

/// Reporting cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[serde(alias = "daily")]
    Daily,
    #[serde(alias = "weekly")]
    Weekly,
    #[serde(alias = "monthly")]
    Monthly,
    #[serde(alias = "quarterly")]
    Quarterly,
    #[serde(alias = "yearly")]
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        };
        f.write_str(name)
    }
}

impl FromStr for Frequency {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "YEARLY" | "ANNUALLY" => Ok(Self::Yearly),
            _ => Err(IndicatorError::UnknownVariant {
                kind: "frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// One selectable category of a categorical indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    /// Stable identifier stored in submission values
    pub id: String,
    /// Display label
    pub label: String,
    /// Display color (hex string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CategoryDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Selection rules for categorical submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    /// Allow more than one category per submission
    #[serde(default)]
    pub allow_multiple: bool,
    /// Upper bound on selections when multiple are allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            allow_multiple: false,
            max_selections: None,
        }
    }
}

/// A monitoring indicator and its analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub indicator_type: IndicatorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_expected: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_expected: Option<f64>,
    pub frequency: Frequency,
    #[serde(default)]
    pub categories: Vec<CategoryDefinition>,
    #[serde(default)]
    pub category_config: CategoryConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_config: Option<AnomalyConfig>,
}

impl Indicator {
    /// Create an indicator with no bounds, categories or anomaly detection
    pub fn new(name: impl Into<String>, indicator_type: IndicatorType, frequency: Frequency) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            indicator_type,
            min_expected: None,
            max_expected: None,
            frequency,
            categories: Vec::new(),
            category_config: CategoryConfig::default(),
            anomaly_config: None,
        }
    }

    /// Set the hard expected range
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_expected = min;
        self.max_expected = max;
        self
    }

    /// Set the category list
    pub fn with_categories(mut self, categories: Vec<CategoryDefinition>) -> Self {
        self.categories = categories;
        self
    }

    /// Set the category selection rules
    pub fn with_category_config(mut self, config: CategoryConfig) -> Self {
        self.category_config = config;
        self
    }

    /// Attach anomaly detection
    pub fn with_anomaly_config(mut self, config: AnomalyConfig) -> Self {
        self.anomaly_config = Some(config);
        self
    }

    /// Look up a category by id
    pub fn category(&self, id: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Check the structural invariants of the definition
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_expected, self.max_expected) {
            if min > max {
                return Err(IndicatorError::Validation(format!(
                    "minExpected {} is greater than maxExpected {}",
                    min, max
                )));
            }
        }

        let mut seen = HashSet::with_capacity(self.categories.len());
        for category in &self.categories {
            if category.id.trim().is_empty() {
                return Err(IndicatorError::Validation(
                    "category id must not be empty".to_string(),
                ));
            }
            if category.id.contains(',') {
                return Err(IndicatorError::Validation(format!(
                    "category id '{}' must not contain a comma",
                    category.id
                )));
            }
            if !seen.insert(category.id.as_str()) {
                return Err(IndicatorError::Validation(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
        }

        if let Some(max) = self.category_config.max_selections {
            if max == 0 {
                return Err(IndicatorError::Validation(
                    "maxSelections must be at least 1".to_string(),
                ));
            }
        }

        if let Some(config) = &self.anomaly_config {
            config.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorical() -> Indicator {
        Indicator::new("Water source", IndicatorType::Categorical, Frequency::Monthly)
            .with_categories(vec![
                CategoryDefinition::new("well", "Well").with_color("#1f77b4"),
                CategoryDefinition::new("river", "River"),
            ])
    }

    #[test]
    fn test_numeric_types() {
        assert!(IndicatorType::Number.is_numeric());
        assert!(IndicatorType::Percentage.is_numeric());
        assert!(IndicatorType::Currency.is_numeric());
        assert!(!IndicatorType::Boolean.is_numeric());
        assert!(!IndicatorType::Text.is_numeric());
        assert!(!IndicatorType::Categorical.is_numeric());
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("WEEKLY".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!(" Quarterly ".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_indicator_json_shape() {
        let json = r#"{
            "id": "8c7a4a4e-8f5e-4a55-9b0f-9d7f2a1c0b11",
            "name": "Clinic visits",
            "type": "NUMBER",
            "minExpected": 0,
            "maxExpected": 500,
            "frequency": "monthly"
        }"#;
        let indicator: Indicator = serde_json::from_str(json).unwrap();
        assert_eq!(indicator.indicator_type, IndicatorType::Number);
        assert_eq!(indicator.frequency, Frequency::Monthly);
        assert_eq!(indicator.max_expected, Some(500.0));
        assert!(indicator.categories.is_empty());
        assert!(!indicator.category_config.allow_multiple);
        assert!(indicator.validate().is_ok());
    }

    #[test]
    fn test_duplicate_category_ids_rejected() {
        let mut indicator = categorical();
        indicator.categories.push(CategoryDefinition::new("well", "Borehole"));
        assert!(indicator.validate().is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let indicator = Indicator::new("Score", IndicatorType::Number, Frequency::Weekly)
            .with_bounds(Some(10.0), Some(1.0));
        assert!(indicator.validate().is_err());
    }

    #[test]
    fn test_category_lookup() {
        let indicator = categorical();
        assert_eq!(indicator.category("well").unwrap().label, "Well");
        assert!(indicator.category("lake").is_none());
        assert!(indicator.validate().is_ok());
    }
}
