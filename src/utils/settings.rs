//! User settings.
//!
//! Settings live in `$HOME/.git-rehead/settings.json`. Values under `env` act
//! as fallbacks for environment variables that are not set.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Environment variables naming the editor, in order of preference.
pub const EDITOR_VARS: &[&str] = &["GIT_REHEAD_EDITOR", "EDITOR"];

/// Environment variable that answers every prompt with its first choice.
pub const ASSUME_YES_VAR: &str = "GIT_REHEAD_ASSUME_YES";

/// Settings loaded from `$HOME/.git-rehead/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from `path`. A missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Settings>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".git-rehead").join("settings.json"))
    }

    /// Returns an environment variable, falling back to these settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }

    /// Whether `value` spells a true flag.
    pub fn is_truthy(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    }
}

/// Returns an environment variable with fallback to settings.
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

/// Tries multiple environment variables with fallback to settings.
pub fn get_env_vars(keys: &[&str]) -> Result<String> {
    keys.iter()
        .find_map(|key| get_env_var(key).ok())
        .ok_or_else(|| anyhow::anyhow!("None of the environment variables found: {keys:?}"))
}

/// Editor command configured for editing files, if any.
pub fn editor() -> Option<String> {
    get_env_vars(EDITOR_VARS)
        .ok()
        .map(|editor| editor.trim().to_string())
        .filter(|editor| !editor.is_empty())
}

/// Whether prompts should take their first choice without asking.
pub fn assume_yes() -> bool {
    match get_env_var(ASSUME_YES_VAR) {
        Ok(value) => Settings::is_truthy(&value),
        Err(e) => {
            debug!("{ASSUME_YES_VAR} not set: {e:#}");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SETTINGS_JSON: &str = r#"{
        "env": {
            "GIT_REHEAD_TEST_EDITOR": "vim",
            "GIT_REHEAD_TEST_FLAG": "yes"
        }
    }"#;

    #[test]
    fn settings_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, SETTINGS_JSON).unwrap();

        let settings = Settings::load_from_path(&settings_path).unwrap();

        assert_eq!(settings.env["GIT_REHEAD_TEST_EDITOR"], "vim");
        assert_eq!(settings.env["GIT_REHEAD_TEST_FLAG"], "yes");
    }

    #[test]
    fn missing_settings_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("absent.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, "{ env: ").unwrap();

        let err = Settings::load_from_path(&settings_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn environment_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, SETTINGS_JSON).unwrap();
        let settings = Settings::load_from_path(&settings_path).unwrap();

        env::set_var("GIT_REHEAD_TEST_EDITOR", "nano");
        assert_eq!(settings.get_env_var("GIT_REHEAD_TEST_EDITOR").unwrap(), "nano");

        env::remove_var("GIT_REHEAD_TEST_EDITOR");
        assert_eq!(settings.get_env_var("GIT_REHEAD_TEST_EDITOR").unwrap(), "vim");
        assert_eq!(settings.get_env_var("GIT_REHEAD_TEST_UNSET"), None);
    }

    #[test]
    fn truthy_flags() {
        for value in ["1", "true", "YES", " on "] {
            assert!(Settings::is_truthy(value), "{value}");
        }
        for value in ["", "0", "false", "no", "sure"] {
            assert!(!Settings::is_truthy(value), "{value}");
        }
    }
}
