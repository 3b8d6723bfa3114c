//! Serialized reports: JSON, YAML and CSV.

pub mod csv;
pub mod yaml;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::csv::{to_csv, CsvKind};
pub use self::yaml::to_yaml;
use crate::analysis::{AnalysisResult, TeamReport};

/// Output encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Table,
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
    /// CSV table.
    Csv,
}

/// What a report describes.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Report<'a> {
    /// A single repository.
    Repository(&'a AnalysisResult),
    /// Several repositories and their merged totals.
    Team(&'a TeamReport),
}

impl Report<'_> {
    /// Totals across everything in the report.
    pub fn merged(&self) -> &AnalysisResult {
        match self {
            Self::Repository(result) => result,
            Self::Team(team) => &team.merged,
        }
    }
}

/// Document wrapper recording who produced a report and when.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    /// Version of this tool.
    pub version: &'static str,
    /// Render time.
    pub generated_at: DateTime<Utc>,
    /// Human description of the subject, e.g. `team platform in acme`.
    pub subject: String,
    /// The report itself.
    pub report: Report<'a>,
}

impl<'a> ReportEnvelope<'a> {
    /// Wraps a report, stamping the current time.
    pub fn new(subject: impl Into<String>, report: Report<'a>) -> Self {
        Self {
            version: crate::VERSION,
            generated_at: Utc::now(),
            subject: subject.into(),
            report,
        }
    }

    /// Encodes the report. Returns `None` for [`OutputFormat::Table`], which
    /// is rendered by the CLI.
    pub fn render(&self, format: OutputFormat, csv_kind: CsvKind) -> Result<Option<String>> {
        let rendered = match format {
            OutputFormat::Table => return Ok(None),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")?
            }
            OutputFormat::Yaml => to_yaml(self)?,
            OutputFormat::Csv => to_csv(&self.report, csv_kind),
        };
        Ok(Some(rendered))
    }
}

/// Writes rendered output to `path`.
pub fn write_output<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
