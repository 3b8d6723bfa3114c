//! Arguments shared by the analysis commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use tracing::debug;

use crate::analysis::{AnalysisOptions, Cancellation, Granularity, DEFAULT_CONCURRENCY};
use crate::config::DetectionConfig;
use crate::detection::Classifier;
use crate::git::DateRange;
use crate::report::{write_output, CsvKind, OutputFormat, ReportEnvelope};
use crate::utils::{get_env_var, Settings};

/// Options controlling what is analyzed and how results are written.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Branch to analyze (defaults to HEAD, or each remote repository's default branch).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Only count commits on or after this UTC date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub since: Option<NaiveDate>,

    /// Only count commits on or before this UTC date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,

    /// Timeline bucket width.
    #[arg(long, value_enum)]
    pub granularity: Option<Granularity>,

    /// Detection config file (defaults to ~/.ai-usage/detection.yaml when present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stop walking after this many seconds and report partial results.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format.
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Table to write when --format csv is used.
    #[arg(long, value_enum, default_value_t = CsvKind::Summary)]
    pub csv_kind: CsvKind,

    /// Write output to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of repositories analyzed at once.
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// GitHub token for listing and cloning private repositories.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Everything a command needs to run an analysis.
pub(crate) struct Prepared {
    pub classifier: Arc<Classifier>,
    pub options: AnalysisOptions,
    pub cancel: Cancellation,
    pub concurrency: usize,
}

impl AnalysisArgs {
    /// Loads settings and detection config and validates the arguments.
    pub(crate) fn prepare(&self) -> Result<Prepared> {
        let settings = Settings::load()?;
        let config = DetectionConfig::discover(self.config.as_deref())?;
        let classifier = config.classifier()?;

        let range = DateRange::new(self.since, self.until)?;
        let granularity = self
            .granularity
            .or(config.granularity)
            .or(settings.granularity)
            .unwrap_or_default();

        let cancel = self
            .timeout
            .map_or_else(Cancellation::new, |secs| {
                Cancellation::with_timeout(Duration::from_secs(secs))
            });
        install_interrupt_handler(&cancel);

        let concurrency = self
            .concurrency
            .or(settings.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1);

        debug!(%granularity, concurrency, tools = classifier.table().tool_count(), "Prepared analysis");

        Ok(Prepared {
            classifier: Arc::new(classifier),
            options: AnalysisOptions {
                branch: self.branch.clone(),
                range,
                granularity,
                token: self.resolve_token(),
            },
            cancel,
            concurrency,
        })
    }

    /// Token from the flag or environment, falling back to the settings file.
    pub(crate) fn resolve_token(&self) -> Option<String> {
        pick_token(self.token.clone(), || get_env_var("GITHUB_TOKEN").ok())
    }

    /// Prints or writes the report; `table` renders the human format.
    pub(crate) fn emit(&self, envelope: &ReportEnvelope<'_>, table: impl FnOnce() -> String) -> Result<()> {
        let rendered = match envelope.render(self.format, self.csv_kind)? {
            Some(rendered) => rendered,
            None => table(),
        };

        match &self.output {
            Some(path) => {
                write_output(path, &rendered)?;
                println!("💾 Report written to {}", path.display());
            }
            None => print!("{rendered}"),
        }
        Ok(())
    }
}

/// Organization from the flag or the settings file.
pub(crate) fn resolve_org(org: Option<&str>) -> Result<String> {
    if let Some(org) = org {
        return Ok(org.to_string());
    }
    Settings::load()?
        .org
        .context("No organization given. Pass --org or set \"org\" in ~/.ai-usage/settings.json")
}

/// First non-blank token of `explicit` and `fallback`.
fn pick_token(explicit: Option<String>, fallback: impl FnOnce() -> Option<String>) -> Option<String> {
    let usable = |token: &String| !token.trim().is_empty();
    explicit.filter(usable).or_else(|| fallback().filter(usable))
}

fn install_interrupt_handler(cancel: &Cancellation) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("⚠️  Interrupted; finishing with partial results");
            cancel.cancel();
        }
    });
}
