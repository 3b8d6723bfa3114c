//! Organization, team and repository listings from GitHub.

pub mod client;
pub mod error;

pub use client::{
    GitHubClient, ListingFuture, RemoteRepository, RepositoryLister, Team, DEFAULT_API_URL,
    PAGE_SIZE,
};
pub use error::RemoteListingError;

use crate::analysis::RepoTarget;
use crate::git::RepoSource;

impl From<&RemoteRepository> for RepoTarget {
    fn from(repo: &RemoteRepository) -> Self {
        Self {
            source: RepoSource::Remote(repo.clone_url.clone()),
            default_branch: repo.default_branch.clone(),
        }
    }
}

/// Finds a team by slug or by case-insensitive display name.
pub fn find_team<'a>(teams: &'a [Team], needle: &str) -> Option<&'a Team> {
    teams
        .iter()
        .find(|t| t.slug == needle)
        .or_else(|| teams.iter().find(|t| t.name.eq_ignore_ascii_case(needle)))
}
