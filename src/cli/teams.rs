//! `teams`: list an organization's teams.

use anyhow::Result;
use clap::Parser;

use super::args::{resolve_org, AnalysisArgs};
use super::team::github_client;
use crate::github::RepositoryLister;

/// Lists the teams in a GitHub organization.
#[derive(Parser, Debug)]
pub struct TeamsCommand {
    /// GitHub organization (defaults to "org" in settings).
    #[arg(long)]
    pub org: Option<String>,

    /// GitHub token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl TeamsCommand {
    /// Executes the teams command.
    pub async fn execute(self) -> Result<()> {
        let org = resolve_org(self.org.as_deref())?;
        let args = AnalysisArgs {
            token: self.token,
            ..AnalysisArgs::default()
        };
        let client = github_client(&args, &org)?;

        let mut teams = client.list_teams().await?;
        teams.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        println!("👥 Teams in {org} ({})", teams.len());
        for team in &teams {
            match team.description.as_deref().filter(|d| !d.is_empty()) {
                Some(description) => println!("   {:<28} {:<28} {description}", team.name, team.slug),
                None => println!("   {:<28} {}", team.name, team.slug),
            }
        }
        Ok(())
    }
}
