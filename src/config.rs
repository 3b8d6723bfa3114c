//! Detection configuration loaded from YAML.
//!
//! ```yaml
//! tools:
//!   Aider:
//!     - pattern: "aider"
//!       weight: 0.9
//! generic:
//!   - pattern: "vibe[\\s-]*coded"
//!     weight: 0.4
//! tiers:
//!   - min_score: 0.8
//!     tier: high
//!   - min_score: 0.6
//!     tier: medium
//! granularity: month
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::Granularity;
use crate::detection::{
    Classifier, SignatureSpec, SignatureTable, SignatureTableBuilder, TierThresholds,
};
use crate::utils::config_dir;

/// User additions to the built-in detection rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfig {
    /// Extra signatures per tool. Known tools gain patterns, unknown ones are added.
    #[serde(default)]
    pub tools: BTreeMap<String, Vec<SignatureSpec>>,

    /// Extra generic signatures.
    #[serde(default)]
    pub generic: Vec<SignatureSpec>,

    /// Replacement tier thresholds.
    #[serde(default)]
    pub tiers: Option<TierThresholds>,

    /// Default timeline granularity.
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

impl DetectionConfig {
    /// Parses a configuration file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read detection config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse detection config: {}", path.display()))
    }

    /// Loads `explicit` if given, otherwise the default file when it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let default_path = Self::default_path()?;
        if default_path.exists() {
            debug!(path = %default_path.display(), "Loading detection config");
            Self::load_from_path(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns $HOME/.ai-usage/detection.yaml.
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("detection.yaml"))
    }

    /// Built-in signatures extended with this configuration.
    pub fn signature_table(&self) -> Result<SignatureTable> {
        let mut builder = SignatureTableBuilder::with_builtin();
        for (tool, specs) in &self.tools {
            builder = builder.extend_tool(tool, specs.iter().cloned());
        }
        builder
            .generic_all(self.generic.iter().cloned())
            .build()
            .context("Invalid detection signatures")
    }

    /// Classifier using this configuration.
    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier::new(
            self.signature_table()?,
            self.tiers.clone().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::detection::ConfidenceTier;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
tools:
  Aider:
    - pattern: "aider"
      weight: 0.9
  Cursor:
    - pattern: "cursor-agent"
      weight: 0.95
generic:
  - pattern: "vibe[\\s-]*coded"
    weight: 0.4
tiers:
  - min_score: 0.9
    tier: high
  - min_score: 0.5
    tier: medium
granularity: day
"#;

    #[test]
    fn parses_and_extends_builtin() {
        let config: DetectionConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.granularity, Some(Granularity::Day));

        let table = config.signature_table().unwrap();
        assert_eq!(table.patterns_for("Aider").len(), 1);
        assert_eq!(table.patterns_for("Cursor").len(), 2);
        assert_eq!(table.generic().len(), SignatureTable::builtin().generic().len() + 1);
    }

    #[test]
    fn classifier_uses_configured_tiers() {
        let config: DetectionConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let classifier = config.classifier().unwrap();

        let detections = classifier.classify_message("Fix bug (ai-assisted cleanup)");
        assert_eq!(detections[0].tier, ConfidenceTier::Medium);

        let detections = classifier.classify_message("vibe coded prototype");
        assert_eq!(detections[0].tool, "generic");
    }

    #[test]
    fn empty_config_is_builtin() {
        let config = DetectionConfig::default();
        let table = config.signature_table().unwrap();
        assert_eq!(table.tool_count(), SignatureTable::builtin().tool_count());
    }

    #[test]
    fn invalid_weight_is_reported() {
        let config: DetectionConfig =
            serde_yaml::from_str("generic:\n  - pattern: x\n    weight: 2.0\n").unwrap();
        let err = config.classifier().unwrap_err();
        assert!(format!("{err:#}").contains("outside [0, 1]"));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(serde_yaml::from_str::<DetectionConfig>("colour: blue\n").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = DetectionConfig::discover(Some(&dir.path().join("missing.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read detection config"));
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("detection.yaml");
        fs::write(&path, SAMPLE).unwrap();
        let config = DetectionConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.tools.len(), 2);
    }
}
