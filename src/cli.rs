//! CLI interface for ai-usage.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod analyze;
pub mod args;
pub(crate) mod formatting;
pub mod signatures;
pub mod team;
pub mod teams;

/// ai-usage: measure AI-assisted development from commit history.
#[derive(Parser)]
#[command(name = "ai-usage")]
#[command(
    about = "Measure AI-assisted development across git repositories",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Analyzes local or remote repositories.
    Analyze(analyze::AnalyzeCommand),
    /// Analyzes every repository of a GitHub team.
    Team(team::TeamCommand),
    /// Analyzes every repository of a GitHub organization.
    Org(team::OrgCommand),
    /// Lists the teams of a GitHub organization.
    Teams(teams::TeamsCommand),
    /// Shows or tests the active detection signatures.
    Signatures(signatures::SignaturesCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze(cmd) => cmd.execute().await,
            Commands::Team(cmd) => cmd.execute().await,
            Commands::Org(cmd) => cmd.execute().await,
            Commands::Teams(cmd) => cmd.execute().await,
            Commands::Signatures(cmd) => cmd.execute(),
        }
    }
}
