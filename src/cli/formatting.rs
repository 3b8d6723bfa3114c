//! Human-readable tables for the analysis commands.

use std::fmt::Write as _;

use crate::analysis::{AnalysisResult, TeamReport};

const TOP_AUTHORS: usize = 10;
const BAR_WIDTH: usize = 20;

/// Formats a percentage with one decimal.
pub(crate) fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// A fixed-width bar for a percentage in `[0, 100]`.
pub(crate) fn percent_bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Truncates to `max` characters, marking the cut with an ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn scope_line(result: &AnalysisResult) -> String {
    let range = match (result.scope.since, result.scope.until) {
        (None, None) => "all time".to_string(),
        (Some(since), None) => format!("since {since}"),
        (None, Some(until)) => format!("until {until}"),
        (Some(since), Some(until)) => format!("{since} to {until}"),
    };
    let branches: Vec<&str> = result.scope.branches.iter().map(String::as_str).collect();
    if branches.is_empty() {
        format!("📅 {range}")
    } else {
        format!("📅 {range} · 🌿 {}", branches.join(", "))
    }
}

/// Renders the overview, tools, authors and timeline of one result.
pub(crate) fn format_result(title: &str, result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 {title}");
    let _ = writeln!(out, "{}", scope_line(result));
    let _ = writeln!(out);
    let _ = writeln!(out, "   Total commits:        {}", result.total_commits);
    let _ = writeln!(
        out,
        "   AI-assisted commits:  {} ({})",
        result.ai_assisted_commits,
        format_percent(result.ai_percentage)
    );
    if result.generic_commits > 0 {
        let _ = writeln!(
            out,
            "   Generic AI mentions:  {}",
            result.generic_commits
        );
    }
    let _ = writeln!(
        out,
        "   Authors using AI:     {} of {}",
        result.ai_authors(),
        result.total_authors()
    );
    let _ = writeln!(
        out,
        "   Confidence:           {} high · {} medium · {} low (avg {:.2})",
        result.confidence.high,
        result.confidence.medium,
        result.confidence.low,
        result.confidence.average
    );

    let tools = result.tools_by_usage();
    if !tools.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "🤖 Tools");
        for (name, count) in tools {
            let _ = writeln!(out, "   {name:<16} {count:>6}");
        }
    }

    let authors = result.authors_by_ai_usage();
    if !authors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "👥 Authors");
        for author in authors.iter().take(TOP_AUTHORS) {
            let _ = writeln!(
                out,
                "   {:<24} {:>5}/{:<5} {:>6}",
                truncate(&author.name, 24),
                author.ai_assisted_commits,
                author.total_commits,
                format_percent(author.ai_percentage)
            );
        }
        if authors.len() > TOP_AUTHORS {
            let _ = writeln!(out, "   … and {} more", authors.len() - TOP_AUTHORS);
        }
    }

    if !result.timeline.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "📈 Timeline");
        for bucket in &result.timeline {
            let _ = writeln!(
                out,
                "   {:<10} {} {:>6} ({}/{})",
                bucket.label,
                percent_bar(bucket.ai_percentage),
                format_percent(bucket.ai_percentage),
                bucket.ai_commits,
                bucket.total_commits
            );
        }
    }

    if !result.is_complete() {
        let _ = writeln!(out);
        for reason in &result.incomplete {
            let _ = writeln!(out, "⚠️  Incomplete: {reason}");
        }
    }

    out
}

/// Renders per-repository rows, failures and the merged totals.
pub(crate) fn format_team(title: &str, team: &TeamReport) -> String {
    let mut out = String::new();

    if !team.results.is_empty() {
        let _ = writeln!(out, "📦 Repositories");
        for result in &team.results {
            let name: Vec<&str> = result.scope.repositories.iter().map(String::as_str).collect();
            let marker = if result.is_complete() { "✅" } else { "⚠️ " };
            let _ = writeln!(
                out,
                "   {marker} {:<28} {:>6} commits {:>7} AI",
                truncate(&name.join(", "), 28),
                result.total_commits,
                format_percent(result.ai_percentage)
            );
        }
        let _ = writeln!(out);
    }

    if !team.failures.is_empty() {
        let _ = writeln!(out, "❌ Failed repositories");
        for failure in &team.failures {
            let _ = writeln!(out, "   {}: {}", failure.repository, failure.error);
        }
        let _ = writeln!(out);
    }

    out.push_str(&format_result(title, &team.merged));
    out
}
