//! Output formatting

use crate::CliResult;
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One block of command output
///
/// Carries both the tabular view and the structured data so either
/// formatter can render it.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub data: Value,
}

impl Section {
    pub fn new(title: impl Into<String>, headers: Vec<&'static str>, data: Value) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
            data,
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }
}

pub trait Formatter: Send + Sync {
    fn render(&self, sections: &[Section]) -> CliResult<String>;
}

/// Aligned plain-text tables
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn render(&self, sections: &[Section]) -> CliResult<String> {
        let mut out = String::new();

        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", section.title.bold().cyan()));

            let mut widths: Vec<usize> = section.headers.iter().map(|h| h.len()).collect();
            for row in &section.rows {
                for (col, cell) in row.iter().enumerate() {
                    let len = cell.chars().count();
                    match widths.get_mut(col) {
                        Some(width) => *width = (*width).max(len),
                        None => widths.push(len),
                    }
                }
            }

            let header = section
                .headers
                .iter()
                .zip(&widths)
                .map(|(h, &w)| format!("{:<w$}", h, w = w))
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(&format!("{}\n", header.trim_end().bold()));

            let rule: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
            out.push_str(&format!("{}\n", "-".repeat(rule)));

            if section.rows.is_empty() {
                out.push_str(&format!("{}\n", "(no rows)".dimmed()));
            }
            for row in &section.rows {
                let line = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
                    .collect::<Vec<_>>()
                    .join("  ");
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }

        Ok(out)
    }
}

/// Pretty-printed JSON of each section's data
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn render(&self, sections: &[Section]) -> CliResult<String> {
        let value = match sections {
            [single] => single.data.clone(),
            many => Value::Array(many.iter().map(|s| s.data.clone()).collect()),
        };
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// Formatter for an output format
pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Yes/no marker for table cells
pub fn flag(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
