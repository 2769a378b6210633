//! TOML-based application configuration.
//!
//! Stores enforcement settings:
//! - Grace period length granted by escape hatches
//! - Sweep and aggregation intervals
//! - The host package and the system-UI allowlist that is never blocked
//!
//! Configuration is stored at `<data_dir>/config.toml`. Per-app budgets are
//! not configuration; they live in the database.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::enforcement::{DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_SWEEP_INTERVAL};
use crate::error::{ConfigError, Result};

/// Enforcement engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementConfig {
    /// Length of each grace grant.
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: u32,
    /// How often expired grace entries are swept.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
    /// How often the usage aggregator runs when the engine is started.
    #[serde(default = "default_aggregation_interval_seconds")]
    pub aggregation_interval_seconds: u64,
    /// Package name of this app; never blocked.
    #[serde(default = "default_host_package")]
    pub host_package: String,
    /// Packages that are never blocked. Supports `prefix*`, `*suffix` and `*infix*`.
    #[serde(default = "default_system_allowlist")]
    pub system_allowlist: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enforcement: EnforcementConfig,
}

fn default_grace_minutes() -> u32 {
    DEFAULT_GRACE_PERIOD_MINUTES
}
fn default_cleanup_interval_seconds() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_secs()
}
fn default_aggregation_interval_seconds() -> u64 {
    60
}
fn default_host_package() -> String {
    "app.focusguard".into()
}
fn default_system_allowlist() -> Vec<String> {
    vec!["com.android.systemui".into(), "*launcher*".into()]
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            grace_minutes: default_grace_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            aggregation_interval_seconds: default_aggregation_interval_seconds(),
            host_package: default_host_package(),
            system_allowlist: default_system_allowlist(),
        }
    }
}

impl EnforcementConfig {
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.grace_minutes))
    }

    pub fn cleanup_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.cleanup_interval_seconds)
    }

    pub fn aggregation_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.aggregation_interval_seconds)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &str, value: u64| {
            if value == 0 {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                })
            } else {
                Ok(())
            }
        };
        positive("enforcement.grace_minutes", u64::from(self.grace_minutes))?;
        positive(
            "enforcement.cleanup_interval_seconds",
            self.cleanup_interval_seconds,
        )?;
        positive(
            "enforcement.aggregation_interval_seconds",
            self.aggregation_interval_seconds,
        )?;
        if self.host_package.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "enforcement.host_package".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a non-negative integer")))?,
                serde_json::Value::Array(_) => {
                    // Accept either a JSON array or a comma-separated list.
                    if value.trim_start().starts_with('[') {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    } else {
                        serde_json::Value::Array(
                            value
                                .split(',')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(|s| serde_json::Value::String(s.to_string()))
                                .collect(),
                        )
                    }
                }
                serde_json::Value::Object(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result must validate.
    ///
    /// Does not persist; call [`Config::save`] afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.enforcement.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.enforcement.grace_minutes, 5);
        assert_eq!(cfg.enforcement.cleanup_interval_seconds, 60);
        assert_eq!(cfg.enforcement.grace_period(), chrono::Duration::minutes(5));
        assert_eq!(cfg.enforcement.cleanup_interval(), StdDuration::from_secs(60));
        assert_eq!(cfg.enforcement.grace_minutes, DEFAULT_GRACE_PERIOD_MINUTES);
        assert_eq!(cfg.enforcement.cleanup_interval(), DEFAULT_SWEEP_INTERVAL);
        assert!(cfg
            .enforcement
            .system_allowlist
            .contains(&"com.android.systemui".to_string()));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[enforcement]\ngrace_minutes = 10\n").unwrap();
        assert_eq!(parsed.enforcement.grace_minutes, 10);
        assert_eq!(parsed.enforcement.cleanup_interval_seconds, 60);
        assert_eq!(parsed.enforcement.host_package, "app.focusguard");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("enforcement.grace_minutes").as_deref(), Some("5"));
        assert_eq!(
            cfg.get("enforcement.host_package").as_deref(),
            Some("app.focusguard")
        );
        assert!(cfg.get("enforcement.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_list() {
        let mut cfg = Config::default();
        cfg.set("enforcement.grace_minutes", "15").unwrap();
        assert_eq!(cfg.enforcement.grace_minutes, 15);

        cfg.set("enforcement.system_allowlist", "com.android.systemui, *home*")
            .unwrap();
        assert_eq!(
            cfg.enforcement.system_allowlist,
            vec!["com.android.systemui".to_string(), "*home*".to_string()]
        );
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("enforcement.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type_and_zero_interval() {
        let mut cfg = Config::default();
        assert!(cfg.set("enforcement.grace_minutes", "soon").is_err());
        assert!(cfg.set("enforcement.cleanup_interval_seconds", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("enforcement.grace_minutes", "7").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().enforcement.grace_minutes, 7);
    }
}
