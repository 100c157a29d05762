//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. global user config (`~/.config/ecopark/config.yaml`)
//! 3. local config (`.ecopark/config.yaml` in the current or a parent directory)
//! 4. `ECOPARK_*` environment variables
//!
//! Command-line flags override all of these in the CLI layer.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::service::http::DEFAULT_TIMEOUT_SECS;

/// Park API used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Directory holding the local config file
pub const LOCAL_DIR: &str = ".ecopark";

/// Accepted `default_format` values
pub const FORMATS: &[&str] = &["auto", "yaml", "tsv", "json", "csv", "md", "id"];

/// Configurable keys with their descriptions
pub const KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the park API"),
    ("timeout_secs", "HTTP request timeout in seconds"),
    ("offline", "Use the in-memory park service (true/false)"),
    ("seed_file", "YAML file with bookings preloaded in offline mode"),
    ("default_format", "Default output format (tsv, json, yaml, csv, md)"),
    ("email", "Contact email proposed in the booking wizard"),
];

/// A value that cannot be stored under a config key
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown configuration key '{0}' (see `ecopark config keys`)")]
    UnknownKey(String),

    #[error("'{value}' is not a valid {key}: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub offline: Option<bool>,
    pub seed_file: Option<PathBuf>,
    pub default_format: Option<String>,
    pub email: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::global_path() {
            if let Some(global) = Self::read(&path) {
                config.merge(global);
            }
        }

        if let Some(path) = Self::local_path() {
            if let Some(local) = Self::read(&path) {
                config.merge(local);
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse one config file; missing files are silently skipped
    fn read(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(config) => Some(config.unwrap_or_default()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Path of the global config file
    pub fn global_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ecopark")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Local config file found by walking up from the current directory
    pub fn local_path() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(LOCAL_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join("config.yaml"))
    }

    /// Local config file to write to: the discovered one, else one in the current directory
    pub fn local_path_for_write() -> std::io::Result<PathBuf> {
        match Self::local_path() {
            Some(path) => Ok(path),
            None => Ok(std::env::current_dir()?.join(LOCAL_DIR).join("config.yaml")),
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.offline.is_some() {
            self.offline = other.offline;
        }
        if other.seed_file.is_some() {
            self.seed_file = other.seed_file;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
    }

    /// Overlay `ECOPARK_*` variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ECOPARK_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(raw) = lookup("ECOPARK_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => warn!(value = %raw, "ignoring non-numeric ECOPARK_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("ECOPARK_OFFLINE") {
            match parse_bool(&raw) {
                Some(flag) => self.offline = Some(flag),
                None => warn!(value = %raw, "ignoring non-boolean ECOPARK_OFFLINE"),
            }
        }
        if let Some(path) = lookup("ECOPARK_SEED_FILE") {
            self.seed_file = Some(PathBuf::from(path));
        }
        if let Some(format) = lookup("ECOPARK_FORMAT") {
            self.default_format = Some(format);
        }
        if let Some(email) = lookup("ECOPARK_EMAIL") {
            self.email = Some(email);
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    /// Value of one key as text, `None` when unset or unknown
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api_url" => self.api_url.clone(),
            "timeout_secs" => self.timeout_secs.map(|v| v.to_string()),
            "offline" => self.offline.map(|v| v.to_string()),
            "seed_file" => self.seed_file.as_ref().map(|p| p.display().to_string()),
            "default_format" => self.default_format.clone(),
            "email" => self.email.clone(),
            _ => None,
        }
    }

    pub fn is_key(key: &str) -> bool {
        KEYS.iter().any(|(k, _)| *k == key)
    }

    /// Convert a command-line value to the YAML type stored under `key`
    pub fn typed_value(key: &str, raw: &str) -> Result<serde_yml::Value, ConfigError> {
        let invalid = |expected| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            expected,
        };
        match key {
            "timeout_secs" => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(|secs| serde_yml::Value::Number(secs.into()))
                .ok_or_else(|| invalid("expected a positive number of seconds")),
            "offline" => parse_bool(raw)
                .map(serde_yml::Value::Bool)
                .ok_or_else(|| invalid("expected true or false")),
            "api_url" if !(raw.starts_with("http://") || raw.starts_with("https://")) => {
                Err(invalid("expected an http:// or https:// URL"))
            }
            "default_format" if !FORMATS.contains(&raw.trim().to_lowercase().as_str()) => {
                Err(invalid("expected one of auto, yaml, tsv, json, csv, md, id"))
            }
            _ if Self::is_key(key) => Ok(serde_yml::Value::String(raw.to_string())),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }
}

/// Accepts true/false, yes/no, on/off and 1/0
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            api_url: Some("http://global".into()),
            timeout_secs: Some(5),
            ..Default::default()
        };
        base.merge(Config {
            api_url: Some("http://local".into()),
            ..Default::default()
        });
        assert_eq!(base.api_url(), "http://local");
        assert_eq!(base.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ECOPARK_API_URL", "http://park.test"),
            ("ECOPARK_OFFLINE", "yes"),
            ("ECOPARK_TIMEOUT_SECS", "oops"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            timeout_secs: Some(3),
            ..Default::default()
        };
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_url(), "http://park.test");
        assert!(config.offline());
        assert_eq!(config.timeout_secs, Some(3));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert!(!config.offline());
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_empty_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(Config::read(&path), Some(Config::default()));

        std::fs::write(&path, "offline: true\nseed_file: seed.yaml\n").unwrap();
        let config = Config::read(&path).unwrap();
        assert!(config.offline());
        assert_eq!(config.get("seed_file").as_deref(), Some("seed.yaml"));
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(
            Config::typed_value("timeout_secs", "30").unwrap(),
            serde_yml::Value::Number(30.into())
        );
        assert_eq!(
            Config::typed_value("offline", "yes").unwrap(),
            serde_yml::Value::Bool(true)
        );
        assert!(matches!(
            Config::typed_value("timeout_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(Config::typed_value("api_url", "ftp://park").is_err());
        assert!(Config::typed_value("default_format", "JSON").is_ok());
        assert_eq!(
            Config::typed_value("colour", "red"),
            Err(ConfigError::UnknownKey("colour".into()))
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
