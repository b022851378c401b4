mod logging;
mod sessions;
mod store;

pub use logging::*;
pub use sessions::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a TOML document.  Missing sections and fields take defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

const POOL_CAPACITY_WARN: usize = 4096;

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.store.path.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "store.path".into(),
                message: format!("path must not be empty (use \"{MEMORY_LOCATION}\" for an in-memory store)"),
            });
        }

        // A zero TTL makes every saved session expire on write.
        if self.sessions.default_ttl_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.default_ttl_secs".into(),
                message: "default TTL must be greater than 0".into(),
            });
        }

        if self.store.sweep_interval_secs == 0 && !self.store.is_memory() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "store.sweep_interval_secs".into(),
                message: "sweeper disabled: expired records stay on disk until overwritten".into(),
            });
        }

        if self.sessions.pool_capacity > POOL_CAPACITY_WARN {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "sessions.pool_capacity".into(),
                message: format!(
                    "{} idle handles is unusually large (>{POOL_CAPACITY_WARN})",
                    self.sessions.pool_capacity
                ),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn empty_path_is_an_error() {
        let mut cfg = Config::default();
        cfg.store.path = "  ".into();
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Error);
        assert_eq!(issues[0].field, "store.path");
    }

    #[test]
    fn zero_ttl_is_an_error() {
        let mut cfg = Config::default();
        cfg.sessions.default_ttl_secs = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "sessions.default_ttl_secs" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn disabled_sweeper_warns_only_for_files() {
        let mut cfg = Config::default();
        cfg.store.sweep_interval_secs = 0;
        assert!(cfg.validate().is_empty());

        cfg.store.path = "sessions.db".into();
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    }

    #[test]
    fn huge_pool_warns() {
        let mut cfg = Config::default();
        cfg.sessions.pool_capacity = 10_000;
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "sessions.pool_capacity");
    }

    #[test]
    fn display_includes_tag_and_field() {
        let err = ConfigError {
            severity: ConfigSeverity::Warning,
            field: "store.path".into(),
            message: "odd".into(),
        };
        assert_eq!(err.to_string(), "[WARN] store.path: odd");
    }

    #[test]
    fn invalid_toml_maps_to_config_error() {
        let err = Config::from_toml_str("[store\npath = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
