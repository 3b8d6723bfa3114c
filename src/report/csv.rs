//! CSV tables for spreadsheets.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::Report;
use crate::analysis::AnalysisResult;
use crate::detection::Detection;

/// Which table to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CsvKind {
    /// One row per repository, plus a total row for multi-repository reports.
    #[default]
    Summary,
    /// One row per AI-assisted commit.
    Commits,
    /// One row per author.
    Authors,
    /// One row per timeline bucket.
    Timeline,
    /// One row per detected tool.
    Tools,
}

/// Renders one CSV table from a report.
pub fn to_csv(report: &Report<'_>, kind: CsvKind) -> String {
    let merged = report.merged();
    let mut out = String::new();
    match kind {
        CsvKind::Summary => summary(report, &mut out),
        CsvKind::Commits => commits(merged, &mut out),
        CsvKind::Authors => authors(merged, &mut out),
        CsvKind::Timeline => timeline(merged, &mut out),
        CsvKind::Tools => tools(merged, &mut out),
    }
    out
}

fn summary(report: &Report<'_>, out: &mut String) {
    row(
        out,
        &[
            "repository",
            "total_commits",
            "ai_assisted_commits",
            "ai_percentage",
            "generic_commits",
            "authors",
            "ai_authors",
            "top_tool",
            "complete",
            "error",
        ],
    );

    match report {
        Report::Repository(result) => {
            summary_row(out, &repository_label(result), result, result.is_complete());
        }
        Report::Team(team) => {
            for result in &team.results {
                summary_row(out, &repository_label(result), result, result.is_complete());
            }
            for failure in &team.failures {
                row(
                    out,
                    &[
                        &failure.repository,
                        "",
                        "",
                        "",
                        "",
                        "",
                        "",
                        "",
                        "false",
                        &failure.error,
                    ],
                );
            }
            summary_row(out, "TOTAL", &team.merged, !team.is_partial());
        }
    }
}

fn summary_row(out: &mut String, label: &str, result: &AnalysisResult, complete: bool) {
    let top_tool = result
        .tools_by_usage()
        .first()
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_default();
    row(
        out,
        &[
            label,
            &result.total_commits.to_string(),
            &result.ai_assisted_commits.to_string(),
            &format!("{:.2}", result.ai_percentage),
            &result.generic_commits.to_string(),
            &result.total_authors().to_string(),
            &result.ai_authors().to_string(),
            &top_tool,
            &complete.to_string(),
            "",
        ],
    );
}

fn commits(result: &AnalysisResult, out: &mut String) {
    row(
        out,
        &[
            "repository",
            "hash",
            "timestamp",
            "author_name",
            "author_email",
            "tools",
            "generic",
            "confidence",
            "tier",
            "summary",
        ],
    );
    for commit in &result.ai_commits {
        let tools: BTreeSet<&str> = commit
            .detections
            .iter()
            .filter(|d| !d.is_generic())
            .map(|d| d.tool.as_str())
            .collect();
        let generic = commit.detections.iter().any(Detection::is_generic);
        row(
            out,
            &[
                &commit.repository,
                &commit.hash,
                &timestamp(commit.timestamp),
                &commit.author_name,
                &commit.author_email,
                &tools.into_iter().collect::<Vec<_>>().join(";"),
                &generic.to_string(),
                &format!("{:.2}", commit.confidence),
                &commit.tier.to_string(),
                &commit.summary,
            ],
        );
    }
}

fn authors(result: &AnalysisResult, out: &mut String) {
    row(
        out,
        &[
            "name",
            "email",
            "total_commits",
            "ai_assisted_commits",
            "ai_percentage",
            "tools",
            "first_ai_commit",
            "last_ai_commit",
        ],
    );
    for author in result.authors_by_ai_usage() {
        let tools: Vec<&str> = author.tools.iter().map(String::as_str).collect();
        row(
            out,
            &[
                &author.name,
                &author.email,
                &author.total_commits.to_string(),
                &author.ai_assisted_commits.to_string(),
                &format!("{:.2}", author.ai_percentage),
                &tools.join(";"),
                &author.first_ai_commit.map(timestamp).unwrap_or_default(),
                &author.last_ai_commit.map(timestamp).unwrap_or_default(),
            ],
        );
    }
}

fn timeline(result: &AnalysisResult, out: &mut String) {
    row(
        out,
        &["period", "total_commits", "ai_commits", "ai_percentage", "tools"],
    );
    for bucket in &result.timeline {
        let tools: Vec<String> = bucket
            .tools
            .iter()
            .map(|(tool, count)| format!("{tool}={count}"))
            .collect();
        row(
            out,
            &[
                &bucket.label,
                &bucket.total_commits.to_string(),
                &bucket.ai_commits.to_string(),
                &format!("{:.2}", bucket.ai_percentage),
                &tools.join(";"),
            ],
        );
    }
}

fn tools(result: &AnalysisResult, out: &mut String) {
    row(
        out,
        &["tool", "commit_count", "authors", "first_seen", "last_seen"],
    );
    for (name, count) in result.tools_by_usage() {
        let Some(stat) = result.tool_stats.get(name) else {
            continue;
        };
        row(
            out,
            &[
                name,
                &count.to_string(),
                &stat.authors.len().to_string(),
                &stat.first_seen.map(timestamp).unwrap_or_default(),
                &stat.last_seen.map(timestamp).unwrap_or_default(),
            ],
        );
    }
}

fn repository_label(result: &AnalysisResult) -> String {
    result
        .scope
        .repositories
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", escape(field));
    }
    out.push('\n');
}

fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::analysis::{Aggregator, AnalysisScope, Granularity, RepoFailure, TeamReport};
    use crate::detection::{Classifier, GENERIC_TOOL};
    use crate::git::CommitRecord;
    use chrono::TimeZone;

    fn sample() -> AnalysisResult {
        let classifier = Classifier::default();
        let scope = AnalysisScope::single("api", Some("main".to_string()), None, None, Granularity::Month);
        let mut aggregator = Aggregator::new("api", scope);
        let commits = [
            ("c1", "Alice", "alice@x", (2024, 1, 5), "Add parser (copilot)"),
            ("c2", "Bob", "bob@x", (2024, 1, 9), "Fix typo"),
            ("c3", "Bob", "bob@x", (2024, 2, 2), "Refactor, with claude"),
            ("c4", "Alice", "alice@x", (2024, 2, 3), "Add \"quoted\" copilot test"),
        ];
        for (hash, name, email, (y, m, d), message) in commits {
            let ts = Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap();
            let record = CommitRecord::new(hash, name, email, ts, message);
            aggregator
                .accumulate(&record, &classifier.classify(&record))
                .unwrap();
        }
        aggregator.finalize()
    }

    #[test]
    fn escape_quotes_when_needed() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn timeline_table() {
        let result = sample();
        let csv = to_csv(&Report::Repository(&result), CsvKind::Timeline);
        insta::assert_snapshot!(csv.trim_end(), @r"
        period,total_commits,ai_commits,ai_percentage,tools
        2024-01,2,1,50.00,GitHub Copilot=1
        2024-02,2,2,100.00,Claude=1;GitHub Copilot=1
        ");
    }

    #[test]
    fn commits_table_escapes_summaries() {
        let result = sample();
        let csv = to_csv(&Report::Repository(&result), CsvKind::Commits);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2],
            "api,c3,2024-02-02T08:30:00Z,Bob,bob@x,Claude,false,0.85,high,\"Refactor, with claude\""
        );
        assert!(lines[3].ends_with("\"Add \"\"quoted\"\" copilot test\""));
    }

    #[test]
    fn summary_and_tools_tables() {
        let result = sample();
        let csv = to_csv(&Report::Repository(&result), CsvKind::Summary);
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "api,4,3,75.00,0,2,2,GitHub Copilot,true,"
        );

        let csv = to_csv(&Report::Repository(&result), CsvKind::Tools);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[1], "GitHub Copilot,2,1,2024-01-05T08:30:00Z,2024-02-03T08:30:00Z");
        assert_eq!(lines[2], "Claude,1,1,2024-02-02T08:30:00Z,2024-02-02T08:30:00Z");
    }

    #[test]
    fn authors_table_orders_by_ai_usage() {
        let result = sample();
        let csv = to_csv(&Report::Repository(&result), CsvKind::Authors);
        let lines: Vec<_> = csv.lines().collect();
        assert!(lines[1].starts_with("Alice,alice@x,2,2,100.00,GitHub Copilot,"));
        assert!(lines[2].starts_with("Bob,bob@x,2,1,50.00,Claude,"));
    }

    #[test]
    fn team_summary_lists_failed_repositories() {
        let result = sample();
        let team = TeamReport {
            results: vec![result.clone()],
            failures: vec![RepoFailure {
                repository: "broken".to_string(),
                source: "/srv/broken".to_string(),
                error: "Not a git repository: /srv/broken".to_string(),
            }],
            merged: result,
        };

        let csv = to_csv(&Report::Team(&team), CsvKind::Summary);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(",complete,error"));
        assert_eq!(lines[1], "api,4,3,75.00,0,2,2,GitHub Copilot,true,");
        assert_eq!(lines[2], "broken,,,,,,,,false,Not a git repository: /srv/broken");
        assert_eq!(lines[3], "TOTAL,4,3,75.00,0,2,2,GitHub Copilot,false,");
    }

    #[test]
    fn commits_table_keeps_generic_out_of_tools() {
        let classifier = Classifier::default();
        let scope = AnalysisScope::single("api", None, None, None, Granularity::Month);
        let mut aggregator = Aggregator::new("api", scope);
        let commits = [
            ("g1", 1, "copilot draft; ai-generated fixtures"),
            ("g2", 2, "Fix bug (ai-assisted cleanup)"),
        ];
        for (hash, day, message) in commits {
            let ts = Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap();
            let record = CommitRecord::new(hash, "Ann", "ann@x", ts, message);
            aggregator
                .accumulate(&record, &classifier.classify(&record))
                .unwrap();
        }
        let result = aggregator.finalize();

        let csv = to_csv(&Report::Repository(&result), CsvKind::Commits);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("api,g1,2024-03-01T08:00:00Z,Ann,ann@x,GitHub Copilot,true,"));
        assert!(lines[2].starts_with("api,g2,2024-03-02T08:00:00Z,Ann,ann@x,,true,0.50,low,"));
        assert!(lines[1..]
            .iter()
            .all(|line| line.split(',').nth(5) != Some(GENERIC_TOOL)));
    }
}
