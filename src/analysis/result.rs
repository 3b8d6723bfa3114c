//! Aggregated analysis results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::{ConfidenceTier, Detection};

/// Width of a timeline bucket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per UTC calendar day.
    Day,
    /// One bucket per UTC calendar month.
    #[default]
    Month,
}

impl Granularity {
    /// First date of the bucket containing `timestamp`.
    pub fn bucket_start(self, timestamp: &DateTime<Utc>) -> NaiveDate {
        let date = timestamp.date_naive();
        match self {
            Self::Day => date,
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Label of the bucket starting at `start`.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            Self::Day => start.format("%Y-%m-%d").to_string(),
            Self::Month => start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => f.write_str("day"),
            Self::Month => f.write_str("month"),
        }
    }
}

/// Percentage of `part` in `total`, or 0 when `total` is 0.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// What a result covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisScope {
    /// Repository names.
    pub repositories: BTreeSet<String>,
    /// Branches walked.
    pub branches: BTreeSet<String>,
    /// Inclusive lower date bound, if any.
    pub since: Option<NaiveDate>,
    /// Inclusive upper date bound, if any.
    pub until: Option<NaiveDate>,
    /// Timeline bucket width.
    pub granularity: Granularity,
}

impl AnalysisScope {
    /// Scope of a single repository walk.
    pub fn single(
        repository: impl Into<String>,
        branch: Option<String>,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
        granularity: Granularity,
    ) -> Self {
        Self {
            repositories: BTreeSet::from([repository.into()]),
            branches: branch.into_iter().collect(),
            since,
            until,
            granularity,
        }
    }

    /// Scope covering nothing yet.
    pub fn empty(
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
        granularity: Granularity,
    ) -> Self {
        Self {
            repositories: BTreeSet::new(),
            branches: BTreeSet::new(),
            since,
            until,
            granularity,
        }
    }
}

/// Per-author totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorStat {
    /// Lexicographically smallest display name seen.
    pub name: String,
    /// Lexicographically smallest spelling of the email seen.
    pub email: String,
    /// Commits in scope.
    pub total_commits: u64,
    /// Commits with at least one detection.
    pub ai_assisted_commits: u64,
    /// `ai_assisted_commits / total_commits * 100`.
    pub ai_percentage: f64,
    /// Tools detected in this author's commits.
    pub tools: BTreeSet<String>,
    /// Earliest AI-assisted commit.
    pub first_ai_commit: Option<DateTime<Utc>>,
    /// Latest AI-assisted commit.
    pub last_ai_commit: Option<DateTime<Utc>>,
}

impl AuthorStat {
    pub(crate) fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            total_commits: 0,
            ai_assisted_commits: 0,
            ai_percentage: 0.0,
            tools: BTreeSet::new(),
            first_ai_commit: None,
            last_ai_commit: None,
        }
    }
}

/// Per-tool totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStat {
    /// Commits in which the tool was detected.
    pub commit_count: u64,
    /// Identity keys of authors using the tool.
    pub authors: BTreeSet<String>,
    /// Earliest commit with the tool.
    pub first_seen: Option<DateTime<Utc>>,
    /// Latest commit with the tool.
    pub last_seen: Option<DateTime<Utc>>,
}

impl ToolStat {
    pub(crate) fn new() -> Self {
        Self {
            commit_count: 0,
            authors: BTreeSet::new(),
            first_seen: None,
            last_seen: None,
        }
    }
}

/// One timeline bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    /// First date of the bucket.
    pub start: NaiveDate,
    /// Display label, `YYYY-MM` or `YYYY-MM-DD`.
    pub label: String,
    /// Commits in the bucket.
    pub total_commits: u64,
    /// AI-assisted commits in the bucket.
    pub ai_commits: u64,
    /// `ai_commits / total_commits * 100`.
    pub ai_percentage: f64,
    /// Per-tool commit counts.
    pub tools: BTreeMap<String, u64>,
}

impl TimelineBucket {
    pub(crate) fn new(start: NaiveDate, granularity: Granularity) -> Self {
        Self {
            start,
            label: granularity.label(start),
            total_commits: 0,
            ai_commits: 0,
            ai_percentage: 0.0,
            tools: BTreeMap::new(),
        }
    }
}

/// Distribution of per-commit confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// AI-assisted commits whose strongest detection is high.
    pub high: u64,
    /// AI-assisted commits whose strongest detection is medium.
    pub medium: u64,
    /// AI-assisted commits whose strongest detection is low.
    pub low: u64,
    /// Sum of per-commit confidence in basis points (1/10000).
    pub confidence_basis_points: u64,
    /// Mean per-commit confidence over AI-assisted commits.
    pub average: f64,
}

impl ConfidenceSummary {
    /// Adds one commit.
    pub(crate) fn record(&mut self, tier: ConfidenceTier, confidence: f64) {
        match tier {
            ConfidenceTier::High => self.high += 1,
            ConfidenceTier::Medium => self.medium += 1,
            ConfidenceTier::Low => self.low += 1,
        }
        self.confidence_basis_points += (confidence * 10_000.0).round() as u64;
    }

    /// Number of commits recorded.
    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }

    pub(crate) fn refresh_average(&mut self) {
        let total = self.total();
        self.average = if total == 0 {
            0.0
        } else {
            self.confidence_basis_points as f64 / 10_000.0 / total as f64
        };
    }
}

/// One AI-assisted commit, kept for detailed reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCommit {
    /// Repository the commit belongs to.
    pub repository: String,
    /// Full hash.
    pub hash: String,
    /// Author display name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Committer time in UTC.
    pub timestamp: DateTime<Utc>,
    /// First message line.
    pub summary: String,
    /// Highest detection confidence.
    pub confidence: f64,
    /// Highest detection tier.
    pub tier: ConfidenceTier,
    /// Everything the classifier found.
    pub detections: Vec<Detection>,
}

/// Summary statistics for one or more repositories.
///
/// Produced by an [`Aggregator`](super::Aggregator) or by merging other
/// results with [`AnalysisResult::merge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// What was analyzed.
    pub scope: AnalysisScope,
    /// Commits in scope.
    pub total_commits: u64,
    /// Commits with at least one detection.
    pub ai_assisted_commits: u64,
    /// `ai_assisted_commits / total_commits * 100`.
    pub ai_percentage: f64,
    /// Commits with at least one generic detection.
    pub generic_commits: u64,
    /// Commits per tool, generic detections excluded.
    pub tools_detected: BTreeMap<String, u64>,
    /// Detailed per-tool statistics.
    pub tool_stats: BTreeMap<String, ToolStat>,
    /// Per-author statistics keyed by lowercased email.
    pub authors: BTreeMap<String, AuthorStat>,
    /// Buckets in chronological order.
    pub timeline: Vec<TimelineBucket>,
    /// Confidence distribution.
    pub confidence: ConfidenceSummary,
    /// AI-assisted commits ordered by time, hash, then repository.
    pub ai_commits: Vec<AiCommit>,
    /// Why the result may not cover everything in scope. Empty when complete.
    pub incomplete: BTreeSet<String>,
}

impl AnalysisResult {
    /// A result with no commits.
    pub fn empty(scope: AnalysisScope) -> Self {
        Self {
            scope,
            total_commits: 0,
            ai_assisted_commits: 0,
            ai_percentage: 0.0,
            generic_commits: 0,
            tools_detected: BTreeMap::new(),
            tool_stats: BTreeMap::new(),
            authors: BTreeMap::new(),
            timeline: Vec::new(),
            confidence: ConfidenceSummary::default(),
            ai_commits: Vec::new(),
            incomplete: BTreeSet::new(),
        }
    }

    /// Whether every commit in scope was processed.
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }

    /// Number of distinct authors.
    pub fn total_authors(&self) -> usize {
        self.authors.len()
    }

    /// Number of authors with at least one AI-assisted commit.
    pub fn ai_authors(&self) -> usize {
        self.authors
            .values()
            .filter(|a| a.ai_assisted_commits > 0)
            .count()
    }

    /// Tools ordered by descending commit count, then name.
    pub fn tools_by_usage(&self) -> Vec<(&str, u64)> {
        let mut tools: Vec<_> = self
            .tools_detected
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        tools.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tools
    }

    /// Authors ordered by descending AI-assisted commits, then identity key.
    pub fn authors_by_ai_usage(&self) -> Vec<&AuthorStat> {
        let mut authors: Vec<_> = self.authors.iter().collect();
        authors.sort_by(|a, b| {
            b.1.ai_assisted_commits
                .cmp(&a.1.ai_assisted_commits)
                .then_with(|| a.0.cmp(b.0))
        });
        authors.into_iter().map(|(_, stat)| stat).collect()
    }

    /// Recomputes every derived percentage and average from the counts.
    pub(crate) fn refresh_derived(&mut self) {
        self.ai_percentage = percentage(self.ai_assisted_commits, self.total_commits);
        for author in self.authors.values_mut() {
            author.ai_percentage = percentage(author.ai_assisted_commits, author.total_commits);
        }
        for bucket in &mut self.timeline {
            bucket.ai_percentage = percentage(bucket.ai_commits, bucket.total_commits);
        }
        self.confidence.refresh_average();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_buckets() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let start = Granularity::Month.bucket_start(&ts);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(Granularity::Month.label(start), "2024-02");
    }

    #[test]
    fn day_buckets() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 1).unwrap();
        let start = Granularity::Day.bucket_start(&ts);
        assert_eq!(Granularity::Day.label(start), "2024-02-29");
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn confidence_average_from_basis_points() {
        let mut summary = ConfidenceSummary::default();
        summary.record(ConfidenceTier::High, 0.9);
        summary.record(ConfidenceTier::Low, 0.5);
        summary.refresh_average();
        assert_eq!(summary.confidence_basis_points, 14_000);
        assert!((summary.average - 0.7).abs() < 1e-12);
    }
}
