//! `analyze`: one or more repositories given by path or URL.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use super::args::AnalysisArgs;
use super::formatting::{format_result, format_team};
use crate::analysis::{analyze_many, analyze_source, RepoTarget};
use crate::git::RepoSource;
use crate::report::{Report, ReportEnvelope};

/// Analyzes local or remote repositories.
#[derive(Parser, Debug)]
pub struct AnalyzeCommand {
    /// Repository paths or clone URLs. Defaults to the current directory.
    #[arg(value_name = "REPO")]
    pub repositories: Vec<String>,

    /// Shared analysis options.
    #[command(flatten)]
    pub args: AnalysisArgs,
}

impl AnalyzeCommand {
    /// Executes the analyze command.
    pub async fn execute(self) -> Result<()> {
        let prepared = self.args.prepare()?;
        let mut sources: Vec<RepoSource> = self
            .repositories
            .iter()
            .map(|r| RepoSource::parse(r))
            .collect();
        if sources.is_empty() {
            sources.push(RepoSource::Local(".".into()));
        }

        if let [source] = sources.as_slice() {
            let source = source.clone();
            let subject = format!("repository {}", source.display_name());
            info!(%source, "Analyzing repository");

            let classifier = prepared.classifier.clone();
            let options = prepared.options.clone();
            let cancel = prepared.cancel.clone();
            let result = tokio::task::spawn_blocking(move || {
                analyze_source(&source, &options, &classifier, &cancel)
            })
            .await
            .context("Analysis worker failed")??;

            let envelope = ReportEnvelope::new(subject.clone(), Report::Repository(&result));
            return self.args.emit(&envelope, || format_result(&subject, &result));
        }

        let targets: Vec<RepoTarget> = sources.into_iter().map(RepoTarget::new).collect();
        let subject = format!("{} repositories", targets.len());
        let team = analyze_many(
            targets,
            prepared.options,
            prepared.classifier,
            prepared.concurrency,
            prepared.cancel,
        )
        .await?;

        let envelope = ReportEnvelope::new(subject.clone(), Report::Team(&team));
        self.args.emit(&envelope, || format_team(&subject, &team))
    }
}
