//! `signatures`: show the active detection rules.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::DetectionConfig;
use crate::detection::Classifier;

/// Lists the tool signatures, generic phrases and tier thresholds in use.
#[derive(Parser, Debug)]
pub struct SignaturesCommand {
    /// Detection config file (defaults to ~/.ai-usage/detection.yaml when present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Classify this message instead of listing signatures.
    #[arg(long, value_name = "MESSAGE")]
    pub test: Option<String>,
}

impl SignaturesCommand {
    /// Executes the signatures command.
    pub fn execute(self) -> Result<()> {
        let classifier = DetectionConfig::discover(self.config.as_deref())?.classifier()?;

        match self.test {
            Some(message) => print!("{}", format_classification(&classifier, &message)),
            None => print!("{}", format_signatures(&classifier)),
        }
        Ok(())
    }
}

fn format_signatures(classifier: &Classifier) -> String {
    let mut out = String::new();
    let table = classifier.table();

    out.push_str(&format!("🤖 Tools ({})\n", table.tool_count()));
    for tool in table.tools() {
        out.push_str(&format!("   {}\n", tool.name()));
        for signature in tool.signatures() {
            out.push_str(&format!(
                "      {:.2}  {}\n",
                signature.weight(),
                signature.pattern()
            ));
        }
    }

    out.push_str(&format!("\n🔎 Generic ({})\n", table.generic().len()));
    for signature in table.generic() {
        out.push_str(&format!(
            "      {:.2}  {}\n",
            signature.weight(),
            signature.pattern()
        ));
    }

    out.push_str("\n📏 Tiers\n");
    for cut in classifier.thresholds().cuts() {
        out.push_str(&format!("   ≥ {:.2}  {}\n", cut.min_score, cut.tier));
    }
    out.push_str("   below   low\n");
    out
}

fn format_classification(classifier: &Classifier, message: &str) -> String {
    let detections = classifier.classify_message(message);
    if detections.is_empty() {
        return "➖ No AI signatures found\n".to_string();
    }

    let mut out = String::new();
    for detection in detections {
        out.push_str(&format!(
            "✅ {} ({}, {:.2}) via {}\n",
            detection.tool, detection.tier, detection.confidence, detection.pattern
        ));
    }
    out
}
