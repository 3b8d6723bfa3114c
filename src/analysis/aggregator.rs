//! Streaming accumulation of classified commits.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::result::{
    AiCommit, AnalysisResult, AnalysisScope, AuthorStat, ConfidenceSummary, TimelineBucket,
    ToolStat,
};
use crate::detection::{overall_confidence, overall_tier, ConfidenceTier, Detection};
use crate::error::AggregatorStateError;
use crate::git::CommitRecord;

/// Folds `(commit, detections)` pairs into an [`AnalysisResult`].
///
/// Memory grows with authors, tools, buckets and AI-assisted commits, never
/// with the number of plain commits. Every statistic is independent of the
/// order commits arrive in.
#[derive(Debug)]
pub struct Aggregator {
    repository: String,
    scope: AnalysisScope,
    total_commits: u64,
    ai_assisted_commits: u64,
    generic_commits: u64,
    tools: HashMap<String, ToolStat>,
    authors: HashMap<String, AuthorStat>,
    buckets: HashMap<NaiveDate, TimelineBucket>,
    confidence: ConfidenceSummary,
    ai_commits: Vec<AiCommit>,
    incomplete: BTreeSet<String>,
    finalized: Option<AnalysisResult>,
}

impl Aggregator {
    /// Starts an aggregator; `repository` tags every recorded AI commit.
    pub fn new(repository: impl Into<String>, scope: AnalysisScope) -> Self {
        Self {
            repository: repository.into(),
            scope,
            total_commits: 0,
            ai_assisted_commits: 0,
            generic_commits: 0,
            tools: HashMap::new(),
            authors: HashMap::new(),
            buckets: HashMap::new(),
            confidence: ConfidenceSummary::default(),
            ai_commits: Vec::new(),
            incomplete: BTreeSet::new(),
            finalized: None,
        }
    }

    /// Commits accumulated so far.
    pub fn commits_seen(&self) -> u64 {
        self.total_commits
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Adds one commit and its detections.
    pub fn accumulate(
        &mut self,
        commit: &CommitRecord,
        detections: &[Detection],
    ) -> Result<(), AggregatorStateError> {
        if self.is_finalized() {
            return Err(AggregatorStateError);
        }

        let key = commit.identity_key();
        let granularity = self.scope.granularity;
        let bucket_start = granularity.bucket_start(&commit.timestamp);

        self.total_commits += 1;

        let author = self
            .authors
            .entry(key.clone())
            .or_insert_with(|| AuthorStat::new(&commit.author_name, &commit.author_email));
        if commit.author_name < author.name {
            author.name.clone_from(&commit.author_name);
        }
        if commit.author_email < author.email {
            author.email.clone_from(&commit.author_email);
        }
        author.total_commits += 1;

        let bucket = self
            .buckets
            .entry(bucket_start)
            .or_insert_with(|| TimelineBucket::new(bucket_start, granularity));
        bucket.total_commits += 1;

        let (Some(confidence), Some(tier)) =
            (overall_confidence(detections), overall_tier(detections))
        else {
            return Ok(());
        };

        self.ai_assisted_commits += 1;
        author.ai_assisted_commits += 1;
        widen(
            &mut author.first_ai_commit,
            &mut author.last_ai_commit,
            commit.timestamp,
        );
        bucket.ai_commits += 1;

        let tools: BTreeSet<&str> = detections
            .iter()
            .filter(|d| !d.is_generic())
            .map(|d| d.tool.as_str())
            .collect();
        for tool in &tools {
            let stat = self
                .tools
                .entry((*tool).to_string())
                .or_insert_with(ToolStat::new);
            stat.commit_count += 1;
            stat.authors.insert(key.clone());
            widen(&mut stat.first_seen, &mut stat.last_seen, commit.timestamp);

            author.tools.insert((*tool).to_string());
            *bucket.tools.entry((*tool).to_string()).or_insert(0) += 1;
        }

        if detections.iter().any(Detection::is_generic) {
            self.generic_commits += 1;
        }

        self.confidence.record(tier, confidence);
        let ai_commit = self.ai_commit(commit, detections, confidence, tier);
        self.ai_commits.push(ai_commit);

        Ok(())
    }

    fn ai_commit(
        &self,
        commit: &CommitRecord,
        detections: &[Detection],
        confidence: f64,
        tier: ConfidenceTier,
    ) -> AiCommit {
        AiCommit {
            repository: self.repository.clone(),
            hash: commit.hash.clone(),
            author_name: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            timestamp: commit.timestamp,
            summary: commit.summary().to_string(),
            confidence,
            tier,
            detections: detections.to_vec(),
        }
    }

    /// Records that the result will not cover everything in scope.
    pub fn mark_incomplete(&mut self, reason: impl Into<String>) -> Result<(), AggregatorStateError> {
        if self.is_finalized() {
            return Err(AggregatorStateError);
        }
        self.incomplete.insert(reason.into());
        Ok(())
    }

    /// Produces the result and closes the aggregator.
    ///
    /// Calling this again returns an identical result.
    pub fn finalize(&mut self) -> AnalysisResult {
        if let Some(result) = &self.finalized {
            return result.clone();
        }

        let mut timeline: Vec<TimelineBucket> = self.buckets.drain().map(|(_, b)| b).collect();
        timeline.sort_by_key(|b| b.start);

        let mut ai_commits = std::mem::take(&mut self.ai_commits);
        sort_ai_commits(&mut ai_commits);

        let tool_stats: BTreeMap<String, ToolStat> = self.tools.drain().collect();
        let tools_detected = tool_stats
            .iter()
            .map(|(name, stat)| (name.clone(), stat.commit_count))
            .collect();

        let mut result = AnalysisResult {
            scope: self.scope.clone(),
            total_commits: self.total_commits,
            ai_assisted_commits: self.ai_assisted_commits,
            ai_percentage: 0.0,
            generic_commits: self.generic_commits,
            tools_detected,
            tool_stats,
            authors: self.authors.drain().collect(),
            timeline,
            confidence: std::mem::take(&mut self.confidence),
            ai_commits,
            incomplete: std::mem::take(&mut self.incomplete),
        };
        result.refresh_derived();

        debug!(
            repository = %self.repository,
            total = result.total_commits,
            ai = result.ai_assisted_commits,
            "Aggregation finalized"
        );

        self.finalized = Some(result.clone());
        result
    }
}

pub(crate) fn widen(
    first: &mut Option<DateTime<Utc>>,
    last: &mut Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) {
    if first.map_or(true, |f| at < f) {
        *first = Some(at);
    }
    if last.map_or(true, |l| at > l) {
        *last = Some(at);
    }
}

pub(crate) fn sort_ai_commits(commits: &mut [AiCommit]) {
    commits.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.hash.cmp(&b.hash))
            .then_with(|| a.repository.cmp(&b.repository))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::analysis::Granularity;
    use crate::detection::{Classifier, GENERIC_TOOL};
    use chrono::{Datelike, TimeZone};

    fn scope() -> AnalysisScope {
        AnalysisScope::single("demo", Some("main".to_string()), None, None, Granularity::Month)
    }

    fn commit(hash: &str, name: &str, email: &str, day: u32, message: &str) -> CommitRecord {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
        CommitRecord::new(hash, name, email, ts, message)
    }

    fn run(commits: &[CommitRecord]) -> AnalysisResult {
        let classifier = Classifier::default();
        let mut aggregator = Aggregator::new("demo", scope());
        for c in commits {
            aggregator.accumulate(c, &classifier.classify(c)).unwrap();
        }
        aggregator.finalize()
    }

    fn scenario_commits() -> Vec<CommitRecord> {
        vec![
            commit("a1", "Alice", "alice@x", 1, "Add parser (copilot)"),
            commit("a2", "Alice", "alice@x", 2, "Fix typo"),
            commit("b1", "Bob", "bob@x", 3, "Refactor with claude"),
            commit("b2", "Bob", "bob@x", 4, "Update deps"),
        ]
    }

    // ── counting ─────────────────────────────────────────────────────

    #[test]
    fn small_repository_mix() {
        let result = run(&scenario_commits());

        assert_eq!(result.total_commits, 4);
        assert_eq!(result.ai_assisted_commits, 2);
        assert_eq!(result.ai_percentage, 50.0);
        assert_eq!(result.tools_detected.get("GitHub Copilot"), Some(&1));
        assert_eq!(result.tools_detected.get("Claude"), Some(&1));

        let alice = &result.authors["alice@x"];
        assert_eq!((alice.total_commits, alice.ai_assisted_commits), (2, 1));
        assert_eq!(alice.ai_percentage, 50.0);
        let bob = &result.authors["bob@x"];
        assert_eq!((bob.total_commits, bob.ai_assisted_commits), (2, 1));

        assert_eq!(result.timeline.len(), 1);
        assert_eq!(result.timeline[0].label, "2024-01");
        assert_eq!(result.timeline[0].total_commits, 4);
        assert_eq!(result.timeline[0].ai_commits, 2);

        assert_eq!(result.confidence.high, 2);
        assert!(result.is_complete());
    }

    #[test]
    fn multi_tool_commit_counts_once_per_tool() {
        let mut commits: Vec<CommitRecord> = (1..=6)
            .map(|i| commit(&format!("p{i}"), "Pat", "pat@x", i, "Routine change"))
            .collect();
        for i in 0..3 {
            commits.push(commit(&format!("c{i}"), "Cy", "cy@x", 10 + i, "Use copilot hints"));
        }
        commits.push(commit("m0", "Cy", "cy@x", 20, "copilot draft, claude review"));

        let result = run(&commits);
        assert_eq!(result.total_commits, 10);
        assert_eq!(result.ai_assisted_commits, 4);
        assert_eq!(
            result.tools_detected,
            BTreeMap::from([("Claude".to_string(), 1), ("GitHub Copilot".to_string(), 4)])
        );
        let author_total: u64 = result.authors.values().map(|a| a.total_commits).sum();
        assert_eq!(author_total, result.total_commits);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let result = run(&[]);
        assert_eq!(result.total_commits, 0);
        assert_eq!(result.ai_percentage, 0.0);
        assert!(result.authors.is_empty());
        assert!(result.timeline.is_empty());
        assert_eq!(result.confidence.average, 0.0);
    }

    #[test]
    fn generic_only_commit_counts_as_ai_but_not_as_tool() {
        let result = run(&[commit("g", "Gina", "gina@x", 5, "Fix bug (ai-assisted cleanup)")]);
        assert_eq!(result.ai_assisted_commits, 1);
        assert_eq!(result.generic_commits, 1);
        assert!(result.tools_detected.is_empty());
        assert!(!result.tools_detected.contains_key(GENERIC_TOOL));
        assert_eq!(result.confidence.low, 1);
        assert_eq!(result.confidence.confidence_basis_points, 5_000);
    }

    #[test]
    fn author_identity_merges_case_and_picks_smallest_name() {
        let result = run(&[
            commit("1", "alice", "Alice@X", 1, "one"),
            commit("2", "Alice", "alice@x", 2, "two"),
        ]);
        assert_eq!(result.total_authors(), 1);
        assert_eq!(result.authors["alice@x"].name, "Alice");
        assert_eq!(result.authors["alice@x"].total_commits, 2);
    }

    #[test]
    fn tool_stats_track_authors_and_span() {
        let result = run(&[
            commit("1", "A", "a@x", 9, "copilot"),
            commit("2", "B", "b@x", 3, "copilot again"),
        ]);
        let stat = &result.tool_stats["GitHub Copilot"];
        assert_eq!(stat.commit_count, 2);
        assert_eq!(stat.authors.len(), 2);
        assert_eq!(stat.first_seen.unwrap().day(), 3);
        assert_eq!(stat.last_seen.unwrap().day(), 9);
    }

    #[test]
    fn day_granularity_splits_buckets() {
        let classifier = Classifier::default();
        let mut aggregator = Aggregator::new(
            "demo",
            AnalysisScope::single("demo", None, None, None, Granularity::Day),
        );
        for c in scenario_commits() {
            aggregator.accumulate(&c, &classifier.classify(&c)).unwrap();
        }
        let result = aggregator.finalize();
        let labels: Vec<_> = result.timeline.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]);
    }

    // ── lifecycle ────────────────────────────────────────────────────

    #[test]
    fn finalize_is_idempotent() {
        let classifier = Classifier::default();
        let mut aggregator = Aggregator::new("demo", scope());
        for c in scenario_commits() {
            aggregator.accumulate(&c, &classifier.classify(&c)).unwrap();
        }
        let first = aggregator.finalize();
        let second = aggregator.finalize();
        assert_eq!(first, second);
    }

    #[test]
    fn accumulate_after_finalize_fails() {
        let mut aggregator = Aggregator::new("demo", scope());
        aggregator.finalize();
        let c = commit("x", "A", "a@x", 1, "copilot");
        assert_eq!(aggregator.accumulate(&c, &[]), Err(AggregatorStateError));
        assert_eq!(aggregator.mark_incomplete("late"), Err(AggregatorStateError));
    }

    #[test]
    fn incomplete_reason_is_kept() {
        let mut aggregator = Aggregator::new("demo", scope());
        aggregator.mark_incomplete("timed out").unwrap();
        let result = aggregator.finalize();
        assert!(!result.is_complete());
        assert!(result.incomplete.contains("timed out"));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        const MESSAGES: &[&str] = &[
            "Fix typo",
            "Add parser (copilot)",
            "Refactor with claude",
            "ai-generated fixtures",
            "chatgpt and cursor",
            "",
        ];

        fn arb_commit() -> impl Strategy<Value = CommitRecord> {
            (0usize..4, 1u32..28, 0usize..MESSAGES.len(), 0u32..1000).prop_map(
                |(author, day, message, n)| {
                    let email = format!("dev{author}@x");
                    let hash = format!("{author}-{day:02}-{message}-{n:04}");
                    commit(&hash, &format!("Dev {author}"), &email, day, MESSAGES[message])
                },
            )
        }

        proptest! {
            #[test]
            fn order_does_not_matter(
                commits in proptest::collection::vec(arb_commit(), 0..40),
                seed in any::<u64>(),
            ) {
                let mut shuffled = commits.clone();
                // deterministic rotate + reverse shuffle
                if !shuffled.is_empty() {
                    let k = (seed as usize) % shuffled.len();
                    shuffled.rotate_left(k);
                    shuffled.reverse();
                }
                prop_assert_eq!(run(&commits), run(&shuffled));
            }

            #[test]
            fn ai_never_exceeds_total(commits in proptest::collection::vec(arb_commit(), 0..40)) {
                let result = run(&commits);
                prop_assert!(result.ai_assisted_commits <= result.total_commits);
                prop_assert!((0.0..=100.0).contains(&result.ai_percentage));
                let bucket_total: u64 = result.timeline.iter().map(|b| b.total_commits).sum();
                prop_assert_eq!(bucket_total, result.total_commits);
                let author_total: u64 = result.authors.values().map(|a| a.total_commits).sum();
                prop_assert_eq!(author_total, result.total_commits);
            }
        }
    }
}
