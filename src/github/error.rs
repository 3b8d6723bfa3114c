//! GitHub listing errors.

use thiserror::Error;

/// Failures while listing teams and repositories.
#[derive(Error, Debug)]
pub enum RemoteListingError {
    /// No token was provided.
    #[error("GitHub token not found. Set GITHUB_TOKEN or pass --token")]
    MissingToken,

    /// The token was rejected.
    #[error("GitHub authentication failed. Check that the token is valid")]
    Unauthorized,

    /// The token lacks permission for the request.
    #[error("GitHub denied access to {0}. Check the token's scopes and organization membership")]
    Forbidden(String),

    /// The organization, team or endpoint does not exist.
    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    /// Any other unsuccessful status.
    #[error("GitHub API request failed: HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response format from GitHub API: {0}")]
    InvalidResponse(String),

    /// Connection or transport failure.
    #[error("Network error: {0}")]
    Network(String),
}
