//! TOML-based application configuration.
//!
//! Stores the generation defaults and the CLI's identity defaults.
//! Configuration is stored at `~/.config/studyflow/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Plan generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Daily budget used when the caller doesn't pass one, in minutes.
    #[serde(default = "default_daily_minutes")]
    pub default_daily_minutes: u32,
}

/// Identity defaults for the CLI, so `--tenant`/`--user` don't have to be
/// repeated on every invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

fn default_daily_minutes() -> u32 {
    240
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_daily_minutes: default_daily_minutes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        data_dir().map(|dir| dir.join("config.toml")).map_err(|e| {
            ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/studyflow"),
                message: e.to_string(),
            }
        })
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "generation.default_daily_minutes" => {
                Some(self.generation.default_daily_minutes.to_string())
            }
            "defaults.tenant_id" => self.defaults.tenant_id.clone(),
            "defaults.user_id" => self.defaults.user_id.clone(),
            _ => None,
        }
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "generation.default_daily_minutes" => {
                self.generation.default_daily_minutes =
                    value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{value}' as minutes"),
                    })?;
            }
            "defaults.tenant_id" => self.defaults.tenant_id = Some(value.to_string()),
            "defaults.user_id" => self.defaults.user_id = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.generation.default_daily_minutes, 240);
        assert!(cfg.defaults.tenant_id.is_none());
    }

    #[test]
    fn get_known_keys() {
        let mut cfg = Config::default();
        cfg.defaults.user_id = Some("user-1".to_string());
        assert_eq!(
            cfg.get("generation.default_daily_minutes"),
            Some("240".to_string())
        );
        assert_eq!(cfg.get("defaults.user_id"), Some("user-1".to_string()));
        assert_eq!(cfg.get("nope"), None);
    }

    #[test]
    fn toml_round_trip() {
        let mut cfg = Config::default();
        cfg.generation.default_daily_minutes = 300;
        cfg.defaults.tenant_id = Some("tenant-1".to_string());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.generation.default_daily_minutes, 300);
        assert_eq!(parsed.defaults.tenant_id, Some("tenant-1".to_string()));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.generation.default_daily_minutes, 240);
    }
}
