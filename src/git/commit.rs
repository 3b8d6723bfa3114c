//! Commit records read from history.

use chrono::{DateTime, Utc};
use git2::Commit;
use serde::{Deserialize, Serialize};

use super::SHORT_HASH_LEN;

/// Display name used when a commit carries no author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Email used when a commit carries no author email.
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";

/// One commit as seen by the classifier and aggregator.
///
/// Text fields are always valid UTF-8; undecodable bytes are replaced and
/// missing identity fields fall back to [`UNKNOWN_AUTHOR`] and
/// [`UNKNOWN_EMAIL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full hex object id.
    pub hash: String,
    /// Author display name.
    pub author_name: String,
    /// Author email address.
    pub author_email: String,
    /// Committer time, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Full commit message.
    pub message: String,
}

impl CommitRecord {
    /// Builds a record, substituting sentinels for blank identity fields.
    pub fn new(
        hash: impl Into<String>,
        author_name: &str,
        author_email: &str,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            author_name: or_sentinel(author_name, UNKNOWN_AUTHOR),
            author_email: or_sentinel(author_email, UNKNOWN_EMAIL),
            timestamp,
            message: message.into(),
        }
    }

    /// Reads a record from a git2 commit, decoding text lossily.
    pub fn from_git_commit(commit: &Commit<'_>) -> Self {
        let author = commit.author();
        let name = String::from_utf8_lossy(author.name_bytes());
        let email = String::from_utf8_lossy(author.email_bytes());
        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();

        let timestamp =
            DateTime::from_timestamp(commit.committer().when().seconds(), 0).unwrap_or_default();

        Self::new(commit.id().to_string(), &name, &email, timestamp, message)
    }

    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..SHORT_HASH_LEN).unwrap_or(&self.hash)
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Key that groups commits by author identity.
    pub fn identity_key(&self) -> String {
        self.author_email.to_lowercase()
    }
}

fn or_sentinel(value: &str, sentinel: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        sentinel.to_string()
    } else {
        trimmed.to_string()
    }
}
