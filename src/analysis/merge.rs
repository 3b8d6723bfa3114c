//! Combining results from independent analyses.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::aggregator::{sort_ai_commits, widen};
use super::result::{AnalysisResult, AnalysisScope, AuthorStat, TimelineBucket, ToolStat};
use crate::error::MergeError;

impl AnalysisResult {
    /// Combines two results into one covering both.
    ///
    /// Counts add, sets union, and open date bounds absorb closed ones.
    /// The operation is commutative and associative, so any fold order over a
    /// set of results gives the same answer.
    pub fn merge(self, other: Self) -> Result<Self, MergeError> {
        if self.scope.granularity != other.scope.granularity {
            return Err(MergeError::GranularityMismatch {
                left: self.scope.granularity,
                right: other.scope.granularity,
            });
        }

        let mut ai_commits = self.ai_commits;
        ai_commits.extend(other.ai_commits);
        sort_ai_commits(&mut ai_commits);

        let mut incomplete = self.incomplete;
        incomplete.extend(other.incomplete);

        let tool_stats = merge_maps(self.tool_stats, other.tool_stats, merge_tool);
        let tools_detected = tool_stats
            .iter()
            .map(|(name, stat)| (name.clone(), stat.commit_count))
            .collect();

        let mut merged = Self {
            scope: merge_scope(self.scope, other.scope),
            total_commits: self.total_commits + other.total_commits,
            ai_assisted_commits: self.ai_assisted_commits + other.ai_assisted_commits,
            ai_percentage: 0.0,
            generic_commits: self.generic_commits + other.generic_commits,
            tools_detected,
            tool_stats,
            authors: merge_maps(self.authors, other.authors, merge_author),
            timeline: merge_timeline(self.timeline, other.timeline),
            confidence: super::ConfidenceSummary {
                high: self.confidence.high + other.confidence.high,
                medium: self.confidence.medium + other.confidence.medium,
                low: self.confidence.low + other.confidence.low,
                confidence_basis_points: self.confidence.confidence_basis_points
                    + other.confidence.confidence_basis_points,
                average: 0.0,
            },
            ai_commits,
            incomplete,
        };
        merged.refresh_derived();
        Ok(merged)
    }

    /// Merges every result, or returns `None` for an empty input.
    pub fn merge_all<I>(results: I) -> Result<Option<Self>, MergeError>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = results.into_iter();
        let Some(first) = iter.next() else {
            return Ok(None);
        };
        iter.try_fold(first, Self::merge).map(Some)
    }
}

fn merge_scope(left: AnalysisScope, right: AnalysisScope) -> AnalysisScope {
    let mut repositories = left.repositories;
    repositories.extend(right.repositories);
    let mut branches = left.branches;
    branches.extend(right.branches);

    AnalysisScope {
        repositories,
        branches,
        since: open_bound(left.since, right.since, std::cmp::min),
        until: open_bound(left.until, right.until, std::cmp::max),
        granularity: left.granularity,
    }
}

// `None` means unbounded and wins over any concrete date.
fn open_bound(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    pick: fn(NaiveDate, NaiveDate) -> NaiveDate,
) -> Option<NaiveDate> {
    Some(pick(a?, b?))
}

fn merge_maps<V>(
    mut left: BTreeMap<String, V>,
    right: BTreeMap<String, V>,
    combine: fn(V, V) -> V,
) -> BTreeMap<String, V> {
    for (key, value) in right {
        let value = match left.remove(&key) {
            Some(existing) => combine(existing, value),
            None => value,
        };
        left.insert(key, value);
    }
    left
}

fn merge_tool(mut left: ToolStat, right: ToolStat) -> ToolStat {
    left.commit_count += right.commit_count;
    left.authors.extend(right.authors);
    for at in right.first_seen.into_iter().chain(right.last_seen) {
        widen(&mut left.first_seen, &mut left.last_seen, at);
    }
    left
}

fn merge_author(mut left: AuthorStat, right: AuthorStat) -> AuthorStat {
    if right.name < left.name {
        left.name = right.name;
    }
    if right.email < left.email {
        left.email = right.email;
    }
    left.total_commits += right.total_commits;
    left.ai_assisted_commits += right.ai_assisted_commits;
    left.tools.extend(right.tools);
    for at in right.first_ai_commit.into_iter().chain(right.last_ai_commit) {
        widen(&mut left.first_ai_commit, &mut left.last_ai_commit, at);
    }
    left
}

fn merge_timeline(left: Vec<TimelineBucket>, right: Vec<TimelineBucket>) -> Vec<TimelineBucket> {
    let mut buckets: BTreeMap<NaiveDate, TimelineBucket> =
        left.into_iter().map(|b| (b.start, b)).collect();

    for bucket in right {
        match buckets.get_mut(&bucket.start) {
            Some(existing) => {
                existing.total_commits += bucket.total_commits;
                existing.ai_commits += bucket.ai_commits;
                for (tool, count) in bucket.tools {
                    *existing.tools.entry(tool).or_insert(0) += count;
                }
            }
            None => {
                buckets.insert(bucket.start, bucket);
            }
        }
    }

    buckets.into_values().collect()
}
