//! Walk, classify and aggregate, for one repository or many.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::aggregator::Aggregator;
use super::cancel::Cancellation;
use super::result::{AnalysisResult, AnalysisScope, Granularity};
use crate::detection::Classifier;
use crate::error::{AnalysisError, RepositoryError};
use crate::git::{DateRange, GitRepository, RepoSource, WalkOptions};

/// Default number of repositories analyzed at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings shared by every repository in a run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Branch to analyze; overrides per-target defaults.
    pub branch: Option<String>,
    /// Date window.
    pub range: DateRange,
    /// Timeline bucket width.
    pub granularity: Granularity,
    /// Token for cloning private remotes.
    pub token: Option<String>,
}

/// Analyzes an opened repository.
///
/// Stops early when `cancel` fires, returning what was gathered so far with
/// the reason recorded in [`AnalysisResult::incomplete`].
pub fn analyze_repository(
    repo: &GitRepository,
    name: &str,
    options: &AnalysisOptions,
    classifier: &Classifier,
    cancel: &Cancellation,
) -> Result<AnalysisResult, AnalysisError> {
    let branch = options.branch.clone().or_else(|| repo.current_branch());
    let scope = AnalysisScope::single(
        name,
        branch,
        options.range.since(),
        options.range.until(),
        options.granularity,
    );
    let mut aggregator = Aggregator::new(name, scope);

    let mut walk = repo
        .walk(&WalkOptions {
            branch: options.branch.clone(),
            range: options.range,
        })?
        .with_cancellation(cancel.clone());

    for record in walk.by_ref() {
        let record = record?;
        let detections = classifier.classify(&record);
        if !detections.is_empty() {
            debug!(hash = record.short_hash(), count = detections.len(), "AI commit");
        }
        aggregator.accumulate(&record, &detections)?;
    }

    if let Some(reason) = walk.stopped() {
        warn!(
            repository = name,
            read = walk.visited(),
            counted = aggregator.commits_seen(),
            %reason,
            "Stopping walk early"
        );
        aggregator.mark_incomplete(format!(
            "{name}: {reason} after reading {} commits",
            walk.visited()
        ))?;
    }

    Ok(aggregator.finalize())
}

/// Materializes `source` (cloning remotes) and analyzes it.
pub fn analyze_source(
    source: &RepoSource,
    options: &AnalysisOptions,
    classifier: &Classifier,
    cancel: &Cancellation,
) -> Result<AnalysisResult, AnalysisError> {
    let materialized = source.materialize(options.token.as_deref())?;
    analyze_repository(
        &materialized.repo,
        &materialized.name,
        options,
        classifier,
        cancel,
    )
}

/// One repository in a multi-repository run.
#[derive(Debug, Clone)]
pub struct RepoTarget {
    /// Where the history lives.
    pub source: RepoSource,
    /// Branch used when the run does not name one.
    pub default_branch: Option<String>,
}

impl RepoTarget {
    /// A target without a default branch.
    pub fn new(source: RepoSource) -> Self {
        Self {
            source,
            default_branch: None,
        }
    }
}

/// A repository that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    /// Repository name.
    pub repository: String,
    /// Source location, credentials stripped.
    pub source: String,
    /// Error chain, outermost first.
    pub error: String,
}

/// Outcome of a multi-repository run.
#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    /// Successful per-repository results, ordered by repository name.
    pub results: Vec<AnalysisResult>,
    /// Repositories that failed, ordered by name.
    pub failures: Vec<RepoFailure>,
    /// All successful results merged.
    pub merged: AnalysisResult,
}

impl TeamReport {
    /// Whether some repository failed or stopped early.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() || !self.merged.is_complete()
    }
}

/// Analyzes several repositories concurrently and merges the results.
///
/// At most `concurrency` repositories are processed at once. A repository
/// failure is recorded in [`TeamReport::failures`] and does not stop the
/// run; aggregator misuse and worker panics do.
pub async fn analyze_many(
    targets: Vec<RepoTarget>,
    options: AnalysisOptions,
    classifier: Arc<Classifier>,
    concurrency: usize,
    cancel: Cancellation,
) -> Result<TeamReport, AnalysisError> {
    let total = targets.len();
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let options = Arc::new(options);

    let futs: Vec<_> = targets
        .into_iter()
        .map(|target| {
            let sem = semaphore.clone();
            let completed = completed.clone();
            let options = options.clone();
            let classifier = classifier.clone();
            let cancel = cancel.clone();

            async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| AnalysisError::Worker(format!("semaphore closed: {e}")))?;

                let name = target.source.display_name();
                let location = target.source.to_string();
                let outcome = tokio::task::spawn_blocking(move || {
                    let mut options = (*options).clone();
                    if options.branch.is_none() {
                        options.branch = target.default_branch;
                    }
                    analyze_source(&target.source, &options, &classifier, &cancel)
                })
                .await
                .map_err(|e| AnalysisError::Worker(e.to_string()))?;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                info!(repository = %name, "{done}/{total} repositories analyzed");

                Ok::<_, AnalysisError>((name, location, outcome))
            }
        })
        .collect();

    let outcomes = futures::future::join_all(futs).await;

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        let (name, location, outcome) = outcome?;
        match outcome {
            Ok(result) => results.push(result),
            Err(AnalysisError::Repository(e)) => {
                warn!(repository = %name, error = %e, "Repository analysis failed");
                failures.push(RepoFailure {
                    repository: name,
                    source: location,
                    error: error_chain(&e),
                });
            }
            Err(e) => return Err(e),
        }
    }

    results.sort_by(|a, b| a.scope.repositories.cmp(&b.scope.repositories));
    failures.sort_by(|a, b| a.repository.cmp(&b.repository));

    let merged = AnalysisResult::merge_all(results.iter().cloned())?.unwrap_or_else(|| {
        AnalysisResult::empty(AnalysisScope::empty(
            options.range.since(),
            options.range.until(),
            options.granularity,
        ))
    });

    Ok(TeamReport {
        results,
        failures,
        merged,
    })
}

fn error_chain(error: &RepositoryError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
