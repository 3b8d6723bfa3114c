//! Classifies commit messages against a signature table.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::signatures::{Signature, SignatureTable, GENERIC_TOOL};
use super::tier::{ConfidenceTier, TierThresholds};
use crate::git::CommitRecord;

/// One piece of evidence that a commit was produced with an AI tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Tool name, or [`GENERIC_TOOL`] for generic phrases.
    pub tool: String,
    /// Pattern that produced this detection.
    pub pattern: String,
    /// Weight of the pattern, in `[0, 1]`.
    pub confidence: f64,
    /// Tier derived from `confidence`.
    pub tier: ConfidenceTier,
}

impl Detection {
    /// Returns true when the detection came from a generic signature.
    pub fn is_generic(&self) -> bool {
        self.tool == GENERIC_TOOL
    }
}

/// Pure, stateless commit classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: SignatureTable,
    thresholds: TierThresholds,
}

impl Classifier {
    /// Creates a classifier over a validated table and thresholds.
    pub fn new(table: SignatureTable, thresholds: TierThresholds) -> Self {
        Self { table, thresholds }
    }

    /// Returns the signature table in use.
    pub fn table(&self) -> &SignatureTable {
        &self.table
    }

    /// Returns the tier thresholds in use.
    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Classifies one commit by its message.
    pub fn classify(&self, commit: &CommitRecord) -> Vec<Detection> {
        self.classify_message(&commit.message)
    }

    /// Classifies a raw message.
    ///
    /// Each tool contributes at most one detection, from its highest-weight
    /// matching signature (first registered wins a tie). A generic signature
    /// contributes only if one of its matches lies outside every span already
    /// matched by a tool-specific signature.
    pub fn classify_message(&self, message: &str) -> Vec<Detection> {
        if message.trim().is_empty() {
            return Vec::new();
        }

        let text = message.to_lowercase();
        let mut detections = Vec::new();
        let mut claimed: Vec<Range<usize>> = Vec::new();

        for tool in self.table.tools() {
            let mut best: Option<&Signature> = None;
            for signature in tool.signatures() {
                let before = claimed.len();
                claimed.extend(signature.regex().find_iter(&text).map(|m| m.range()));
                let matched = claimed.len() > before;
                if matched && best.map_or(true, |b| signature.weight() > b.weight()) {
                    best = Some(signature);
                }
            }
            if let Some(signature) = best {
                detections.push(self.detection(tool.name(), signature));
            }
        }

        for signature in self.table.generic() {
            let independent = signature
                .regex()
                .find_iter(&text)
                .any(|m| !claimed.iter().any(|span| overlaps(span, &m.range())));
            if independent {
                detections.push(self.detection(GENERIC_TOOL, signature));
            }
        }

        detections
    }

    fn detection(&self, tool: &str, signature: &Signature) -> Detection {
        Detection {
            tool: tool.to_string(),
            pattern: signature.pattern().to_string(),
            confidence: signature.weight(),
            tier: self.thresholds.tier_for(signature.weight()),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(SignatureTable::builtin(), TierThresholds::default())
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Highest confidence among the detections.
pub fn overall_confidence(detections: &[Detection]) -> Option<f64> {
    detections
        .iter()
        .map(|d| d.confidence)
        .max_by(f64::total_cmp)
}

/// Highest tier among the detections.
pub fn overall_tier(detections: &[Detection]) -> Option<ConfidenceTier> {
    detections.iter().map(|d| d.tier).max()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn tools(detections: &[Detection]) -> Vec<&str> {
        detections.iter().map(|d| d.tool.as_str()).collect()
    }

    // ── tool-specific ────────────────────────────────────────────────

    #[test]
    fn plain_message_has_no_detections() {
        let classifier = Classifier::default();
        assert!(classifier.classify_message("Fix off-by-one in pager").is_empty());
    }

    #[test]
    fn empty_and_whitespace_messages_have_no_detections() {
        let classifier = Classifier::default();
        assert!(classifier.classify_message("").is_empty());
        assert!(classifier.classify_message("  \n\t ").is_empty());
    }

    #[test]
    fn copilot_mention_is_high() {
        let classifier = Classifier::default();
        let detections = classifier.classify_message("Add parser (copilot)");
        assert_eq!(tools(&detections), vec!["GitHub Copilot"]);
        assert_eq!(detections[0].tier, ConfidenceTier::High);
    }

    #[test]
    fn highest_weight_signature_wins_per_tool() {
        let classifier = Classifier::default();
        let detections = classifier
            .classify_message("Refactor cache\n\nCo-authored-by: Claude <noreply@anthropic.com>");
        assert_eq!(tools(&detections), vec!["Claude"]);
        assert_eq!(detections[0].pattern, r"co-authored-by:.*claude");
        assert!((detections[0].confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn multiple_tools_in_one_message() {
        let classifier = Classifier::default();
        let detections = classifier.classify_message("Drafted with ChatGPT, reviewed by Claude");
        assert_eq!(tools(&detections), vec!["ChatGPT", "Claude"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(
            tools(&classifier.classify_message("WINDSURF cleanup")),
            vec!["Windsurf"]
        );
    }

    #[test]
    fn word_boundaries_avoid_false_positives() {
        let classifier = Classifier::default();
        assert!(classifier.classify_message("Read devinfo from sysfs").is_empty());
        assert!(classifier.classify_message("Move cursorPosition helper").is_empty());
    }

    #[test]
    fn commit_record_uses_message() {
        let classifier = Classifier::default();
        let commit = CommitRecord::new(
            "abc123",
            "Alice",
            "alice@example.com",
            chrono::DateTime::default(),
            "Generated by Tabnine",
        );
        assert_eq!(tools(&classifier.classify(&commit)), vec!["Tabnine"]);
    }

    // ── generic ──────────────────────────────────────────────────────

    #[test]
    fn generic_phrase_is_low() {
        let classifier = Classifier::default();
        let detections = classifier.classify_message("Fix bug (ai-assisted cleanup)");
        assert_eq!(tools(&detections), vec![GENERIC_TOOL]);
        assert!(detections[0].is_generic());
        assert_eq!(detections[0].tier, ConfidenceTier::Low);
    }

    #[test]
    fn generic_inside_tool_match_is_suppressed() {
        let classifier = Classifier::default();
        let detections = classifier.classify_message("chatgpt-generated migration");
        assert_eq!(tools(&detections), vec!["ChatGPT"]);
    }

    #[test]
    fn independent_generic_phrase_is_kept_next_to_tool() {
        let classifier = Classifier::default();
        let detections =
            classifier.classify_message("Copilot suggestion; rest is ai-generated boilerplate");
        assert_eq!(tools(&detections), vec!["GitHub Copilot", GENERIC_TOOL]);
    }

    // ── aggregation helpers ──────────────────────────────────────────

    #[test]
    fn overall_helpers() {
        let classifier = Classifier::default();
        let detections =
            classifier.classify_message("cursor tweak, otherwise auto-generated");
        assert_eq!(overall_tier(&detections), Some(ConfidenceTier::High));
        assert_eq!(overall_confidence(&detections), Some(0.8));
        assert_eq!(overall_tier(&[]), None);
        assert_eq!(overall_confidence(&[]), None);
    }

    #[test]
    fn custom_table_and_thresholds() {
        let table = SignatureTable::builder()
            .tool("Aider", [("aider", 0.55)])
            .build()
            .unwrap();
        let classifier = Classifier::new(table, TierThresholds::default());
        let detections = classifier.classify_message("aider: rename module");
        assert_eq!(detections[0].tier, ConfidenceTier::Low);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn classification_is_deterministic(message in ".{0,200}") {
                let classifier = Classifier::default();
                prop_assert_eq!(
                    classifier.classify_message(&message),
                    classifier.classify_message(&message)
                );
            }

            #[test]
            fn at_most_one_detection_per_tool(message in "(copilot|claude|gpt-4|chatgpt|cursor| |x){0,30}") {
                let classifier = Classifier::default();
                let detections = classifier.classify_message(&message);
                let mut names: Vec<_> = detections
                    .iter()
                    .filter(|d| !d.is_generic())
                    .map(|d| d.tool.clone())
                    .collect();
                let total = names.len();
                names.dedup();
                prop_assert_eq!(names.len(), total);
            }
        }
    }
}
