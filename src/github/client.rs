//! GitHub REST API client for team and repository listings.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::error::RemoteListingError;

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Items requested per page.
pub const PAGE_SIZE: usize = 100;

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A team in an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A repository as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    /// Short name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// HTTPS clone URL.
    pub clone_url: String,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Whether the repository is archived.
    #[serde(default)]
    pub archived: bool,
    /// Default branch, when reported.
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Future type returned by [`RepositoryLister`] methods.
pub type ListingFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<Vec<T>, RemoteListingError>> + Send + 'a>>;

/// Source of team and repository listings for an organization.
pub trait RepositoryLister: Send + Sync {
    /// Lists the organization's teams.
    fn list_teams(&self) -> ListingFuture<'_, Team>;

    /// Lists the repositories a team has access to.
    fn list_team_repositories<'a>(&'a self, team_slug: &'a str)
        -> ListingFuture<'a, RemoteRepository>;

    /// Lists every repository in the organization.
    fn list_org_repositories(&self) -> ListingFuture<'_, RemoteRepository>;
}

/// GitHub REST API client bound to one organization.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
    org: String,
}

impl GitHubClient {
    /// Creates a client for `org` against the public API.
    pub fn new(token: impl Into<String>, org: impl Into<String>) -> Result<Self, RemoteListingError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(RemoteListingError::MissingToken);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ai-usage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteListingError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            token,
            org: org.into(),
        })
    }

    /// Points the client at another API root, such as GitHub Enterprise.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Organization this client lists.
    pub fn org(&self) -> &str {
        &self.org
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
    ) -> Result<Vec<T>, RemoteListingError> {
        let url = format!("{}{path}", self.base_url);
        let per_page = PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut page = 1_u32;

        loop {
            let page_str = page.to_string();
            let mut query = vec![("per_page", per_page.as_str()), ("page", page_str.as_str())];
            query.extend_from_slice(extra_query);
            let page_url = Url::parse_with_params(&url, &query)
                .map_err(|e| RemoteListingError::InvalidResponse(format!("bad URL {url}: {e}")))?;
            debug!(url = %page_url, "Requesting GitHub page");

            let response = self
                .client
                .get(page_url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION)
                .send()
                .await
                .map_err(|e| RemoteListingError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_else(|e| {
                    debug!("Failed to read error response body: {e}");
                    String::new()
                });
                return Err(map_status(status, path, body));
            }

            let batch: Vec<T> = response
                .json()
                .await
                .map_err(|e| RemoteListingError::InvalidResponse(e.to_string()))?;

            let count = batch.len();
            items.extend(batch);
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!(%url, count = items.len(), "Fetched GitHub listing");
        Ok(items)
    }
}

fn map_status(status: StatusCode, path: &str, body: String) -> RemoteListingError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteListingError::Unauthorized,
        StatusCode::FORBIDDEN => RemoteListingError::Forbidden(path.to_string()),
        StatusCode::NOT_FOUND => RemoteListingError::NotFound(path.to_string()),
        _ => RemoteListingError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

impl RepositoryLister for GitHubClient {
    fn list_teams(&self) -> ListingFuture<'_, Team> {
        Box::pin(async move {
            self.paginate(&format!("/orgs/{}/teams", self.org), &[])
                .await
        })
    }

    fn list_team_repositories<'a>(
        &'a self,
        team_slug: &'a str,
    ) -> ListingFuture<'a, RemoteRepository> {
        Box::pin(async move {
            self.paginate(
                &format!("/orgs/{}/teams/{team_slug}/repos", self.org),
                &[],
            )
            .await
        })
    }

    fn list_org_repositories(&self) -> ListingFuture<'_, RemoteRepository> {
        Box::pin(async move {
            self.paginate(&format!("/orgs/{}/repos", self.org), &[("type", "all")])
                .await
        })
    }
}
