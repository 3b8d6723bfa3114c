//! Error taxonomy for the analysis engine.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::analysis::Granularity;

/// Failures that are fatal to a single repository's analysis.
///
/// In a multi-repository run these are captured per repository and reported
/// next to the successful results instead of aborting the run.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The path does not contain a readable git repository.
    #[error("Not a git repository: {path}")]
    NotARepository {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying git error.
        #[source]
        source: git2::Error,
    },

    /// The requested branch cannot be resolved.
    #[error("Branch '{0}' does not exist")]
    BranchNotFound(String),

    /// `since` lies after `until`.
    #[error("Invalid date range: since ({since}) is after until ({until})")]
    InvalidDateRange {
        /// Inclusive lower bound.
        since: NaiveDate,
        /// Inclusive upper bound.
        until: NaiveDate,
    },

    /// A remote source could not be cloned locally.
    #[error("Failed to clone {url}")]
    Clone {
        /// Remote location, with credentials stripped.
        url: String,
        /// Underlying git error.
        #[source]
        source: git2::Error,
    },

    /// Local scratch space for a clone could not be created.
    #[error("Failed to prepare clone directory: {0}")]
    Workspace(#[from] std::io::Error),

    /// Reading the commit graph failed part way.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// Raised when an aggregator is used after it has been finalized.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Aggregator already finalized; no further commits can be accumulated")]
pub struct AggregatorStateError;

/// Raised when two results cannot be combined.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// Timeline buckets of different widths cannot be summed.
    #[error("Cannot merge a {left} timeline with a {right} timeline")]
    GranularityMismatch {
        /// Granularity of the left operand.
        left: Granularity,
        /// Granularity of the right operand.
        right: Granularity,
    },
}

/// Failures that stop an analysis run outright.
///
/// Repository failures stop only that repository's pipeline; when several
/// repositories are analyzed they are captured per repository instead of
/// surfacing here.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A repository could not be analyzed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// An aggregator was misused.
    #[error(transparent)]
    AggregatorState(#[from] AggregatorStateError),

    /// Per-repository results could not be combined.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A worker task panicked or was aborted.
    #[error("Analysis worker failed: {0}")]
    Worker(String),
}
