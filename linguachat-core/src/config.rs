//! User configuration and XDG file locations.
//!
//! Config is read once at startup. A missing or unparseable file is a soft
//! failure: it is logged and defaults are used.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::speech::is_known_language;
use crate::types::{default_scenarios, LearnerProfile, Scenario, PROFICIENCY_LEVELS};

const APP_DIR: &str = "linguachat";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub native_language: String,
    pub target_language: String,
    pub proficiency_level: String,
    pub scenarios: Vec<Scenario>,
}

impl Default for Config {
    fn default() -> Self {
        let profile = LearnerProfile::default();
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            native_language: profile.native_language,
            target_language: profile.target_language,
            proficiency_level: profile.proficiency_level,
            scenarios: default_scenarios(),
        }
    }
}

impl Config {
    pub fn profile(&self) -> LearnerProfile {
        LearnerProfile {
            native_language: self.native_language.clone(),
            target_language: self.target_language.clone(),
            proficiency_level: self.proficiency_level.clone(),
        }
    }

    /// Logs values outside the known catalogs. They are still used as-is.
    fn warn_unknown_values(&self) {
        for (field, language) in [
            ("native_language", &self.native_language),
            ("target_language", &self.target_language),
        ] {
            if !is_known_language(language) {
                warn!(field, language = %language, "unknown language, speech falls back to en-US");
            }
        }
        if !PROFICIENCY_LEVELS.contains(&self.proficiency_level.as_str()) {
            warn!(level = %self.proficiency_level, "unknown proficiency level");
        }
        if self.scenarios.is_empty() {
            warn!("config lists no scenarios");
        }
    }
}

/// `$var` if set and non-empty, else `$HOME/<fallback>`.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(fallback))
        })
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// `$XDG_CONFIG_HOME/linguachat`, falling back to `~/.config/linguachat`.
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Theme preference file, next to the config file.
pub fn preferences_path() -> PathBuf {
    config_dir().join("preferences.toml")
}

/// `$XDG_STATE_HOME/linguachat`, falling back to `~/.local/state/linguachat`.
/// Holds the log file.
pub fn state_dir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state").join(APP_DIR)
}

/// Loads the config from [`config_path`]. Never fails.
pub fn load_config() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            info!(path = %path.display(), "no config file, using defaults: {e}");
            return Config::default();
        }
    };
    parse_config(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), "config parse error, using defaults: {e}");
        Config::default()
    })
}

pub fn parse_config(raw: &str) -> Result<Config, toml::de::Error> {
    let config: Config = toml::from_str(raw)?;
    config.warn_unknown_values();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.scenarios.len(), 5);
        assert_eq!(config.profile(), LearnerProfile::default());
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let config = parse_config(
            r#"
server_url = "http://tutor.local:8080"
target_language = "French"

[[scenarios]]
id = "restaurant"
name = "At a Restaurant"
"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://tutor.local:8080");
        assert_eq!(config.target_language, "French");
        assert_eq!(config.native_language, "English");
        assert_eq!(config.scenarios, vec![Scenario::new("restaurant", "At a Restaurant")]);
    }

    #[test]
    fn unknown_values_are_kept() {
        let config = parse_config("proficiency_level = \"Fluent\"\ntarget_language = \"Klingon\"").unwrap();
        assert_eq!(config.profile().proficiency_level, "Fluent");
        assert_eq!(config.profile().target_language, "Klingon");
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("server_url = [").is_err());
    }
}
