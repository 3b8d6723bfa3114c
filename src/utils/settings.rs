//! Settings and configuration utilities.
//!
//! This module reads settings from $HOME/.ai-usage/settings.json and uses
//! them as a fallback for environment variables and run defaults.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analysis::Granularity;

/// Directory under $HOME holding user configuration.
pub const CONFIG_DIR: &str = ".ai-usage";

/// Settings loaded from $HOME/.ai-usage/settings.json.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// GitHub organization used when none is given on the command line.
    #[serde(default)]
    pub org: Option<String>,

    /// Number of repositories analyzed at once.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Default timeline granularity.
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path. A missing file yields defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }
}

/// Returns $HOME/.ai-usage.
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(CONFIG_DIR))
}

/// Returns an environment variable with fallback to the settings file.
pub fn get_env_var(key: &str) -> Result<String> {
    if let Ok(value) = env::var(key) {
        return Ok(value);
    }

    match Settings::load() {
        Ok(settings) => settings
            .env
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Environment variable not found: {key}")),
        Err(err) => Err(anyhow::anyhow!("Environment variable not found: {key}").context(err)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("nope.json")).unwrap();
        assert!(settings.env.is_empty());
        assert!(settings.org.is_none());
    }

    #[test]
    fn settings_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(
            &settings_path,
            r#"{
                "env": { "AI_USAGE_TEST_TOKEN": "from_settings" },
                "org": "acme",
                "concurrency": 8,
                "granularity": "day"
            }"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(&settings_path).unwrap();
        assert_eq!(settings.org.as_deref(), Some("acme"));
        assert_eq!(settings.concurrency, Some(8));
        assert_eq!(settings.granularity, Some(Granularity::Day));
        assert_eq!(
            settings.get_env_var("AI_USAGE_TEST_TOKEN").as_deref(),
            Some("from_settings")
        );
    }

    #[test]
    fn environment_wins_over_settings() {
        let settings = Settings {
            env: HashMap::from([(
                "AI_USAGE_TEST_PRECEDENCE".to_string(),
                "from_settings".to_string(),
            )]),
            ..Settings::default()
        };

        env::set_var("AI_USAGE_TEST_PRECEDENCE", "from_env");
        assert_eq!(
            settings.get_env_var("AI_USAGE_TEST_PRECEDENCE").as_deref(),
            Some("from_env")
        );
        env::remove_var("AI_USAGE_TEST_PRECEDENCE");
        assert_eq!(
            settings.get_env_var("AI_USAGE_TEST_PRECEDENCE").as_deref(),
            Some("from_settings")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, "{ not json").unwrap();
        let err = Settings::load_from_path(&settings_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }
}
