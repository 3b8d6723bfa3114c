//! `team` and `org`: every repository of a GitHub team or organization.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

use super::args::{resolve_org, AnalysisArgs};
use super::formatting::format_team;
use crate::analysis::{analyze_many, RepoTarget, TeamReport};
use crate::github::{find_team, GitHubClient, RemoteRepository, RepositoryLister};
use crate::report::{Report, ReportEnvelope};

/// Analyzes the repositories a GitHub team has access to.
#[derive(Parser, Debug)]
pub struct TeamCommand {
    /// Team slug or display name.
    pub team: String,

    /// GitHub organization (defaults to "org" in settings).
    #[arg(long)]
    pub org: Option<String>,

    /// Include archived repositories.
    #[arg(long)]
    pub include_archived: bool,

    /// Shared analysis options.
    #[command(flatten)]
    pub args: AnalysisArgs,
}

impl TeamCommand {
    /// Executes the team command.
    pub async fn execute(self) -> Result<()> {
        let org = resolve_org(self.org.as_deref())?;
        let client = github_client(&self.args, &org)?;

        let teams = client.list_teams().await?;
        let team = find_team(&teams, &self.team)
            .with_context(|| format!("Team '{}' not found in organization {org}", self.team))?;

        let mut progress = io::stderr();
        writeln!(progress, "🔍 Listing repositories for team {} in {org}", team.name)?;
        let repos = client.list_team_repositories(&team.slug).await?;

        let subject = format!("team {} in {org}", team.name);
        let report = run(&self.args, &repos, self.include_archived, &mut progress).await?;
        let envelope = ReportEnvelope::new(subject.clone(), Report::Team(&report));
        self.args.emit(&envelope, || format_team(&subject, &report))
    }
}

/// Analyzes every repository in a GitHub organization.
#[derive(Parser, Debug)]
pub struct OrgCommand {
    /// GitHub organization (defaults to "org" in settings).
    #[arg(long)]
    pub org: Option<String>,

    /// Include archived repositories.
    #[arg(long)]
    pub include_archived: bool,

    /// Shared analysis options.
    #[command(flatten)]
    pub args: AnalysisArgs,
}

impl OrgCommand {
    /// Executes the org command.
    pub async fn execute(self) -> Result<()> {
        let org = resolve_org(self.org.as_deref())?;
        let client = github_client(&self.args, &org)?;

        let mut progress = io::stderr();
        writeln!(progress, "🔍 Listing repositories in {org}")?;
        let repos = client.list_org_repositories().await?;

        let subject = format!("organization {org}");
        let report = run(&self.args, &repos, self.include_archived, &mut progress).await?;
        let envelope = ReportEnvelope::new(subject.clone(), Report::Team(&report));
        self.args.emit(&envelope, || format_team(&subject, &report))
    }
}

pub(crate) fn github_client(args: &AnalysisArgs, org: &str) -> Result<GitHubClient> {
    let token = args.resolve_token().unwrap_or_default();
    Ok(GitHubClient::new(token, org)?)
}

/// Repositories worth analyzing, in listing order.
pub(crate) fn select_targets(repos: &[RemoteRepository], include_archived: bool) -> Vec<RepoTarget> {
    repos
        .iter()
        .filter(|r| include_archived || !r.archived)
        .map(RepoTarget::from)
        .collect()
}

/// Analyzes the selected repositories. Progress goes to `progress`, never
/// to stdout, which carries the report.
async fn run(
    args: &AnalysisArgs,
    repos: &[RemoteRepository],
    include_archived: bool,
    progress: &mut (dyn Write + Send),
) -> Result<TeamReport> {
    let targets = select_targets(repos, include_archived);
    if targets.is_empty() {
        writeln!(progress, "ℹ️  No repositories to analyze")?;
    } else {
        writeln!(progress, "📥 Analyzing {} repositories", targets.len())?;
    }

    let prepared = args.prepare()?;
    let report = analyze_many(
        targets,
        prepared.options,
        prepared.classifier,
        prepared.concurrency,
        prepared.cancel,
    )
    .await?;

    if report.is_partial() {
        writeln!(
            progress,
            "⚠️  Partial report: {} failed, {} incomplete",
            report.failures.len(),
            report.merged.incomplete.len()
        )?;
    }
    Ok(report)
}
