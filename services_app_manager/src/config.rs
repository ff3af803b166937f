//! Manager configuration
//!
//! Stored as JSON. Every field has a default, so an empty object is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported configuration version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMgrConfig {
    /// Format version
    pub version: u32,
    /// Entry library handed to every spawned process
    pub so_path: String,
    /// Socket of the spawner daemon
    pub spawn_socket_path: String,
    /// Extra attempts after a failed spawn request
    pub spawn_connect_retries: u32,
    /// Capacity of the recent application list
    pub max_recent_apps: usize,
    /// Uid used when application info carries none
    pub default_uid: i32,
}

impl AppMgrConfig {
    pub const CURRENT_VERSION: u32 = 1;

    /// Parses and validates JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if self.so_path.is_empty() {
            return Err(ConfigError::Invalid("so_path must not be empty".to_string()));
        }
        if self.max_recent_apps == 0 {
            return Err(ConfigError::Invalid("max_recent_apps must be positive".to_string()));
        }
        if !core_types::is_valid_uid(self.default_uid) {
            return Err(ConfigError::Invalid(format!(
                "default_uid {} out of range",
                self.default_uid
            )));
        }
        Ok(())
    }
}

impl Default for AppMgrConfig {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            so_path: "system/lib64/libappkit.z.so".to_string(),
            spawn_socket_path: "/dev/unix/socket/AppSpawn".to_string(),
            spawn_connect_retries: 1,
            max_recent_apps: 64,
            default_uid: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AppMgrConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = AppMgrConfig::from_json("{}").unwrap();
        assert_eq!(config, AppMgrConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AppMgrConfig::from_json(r#"{"max_recent_apps": 4, "default_uid": 1000}"#).unwrap();
        assert_eq!(config.max_recent_apps, 4);
        assert_eq!(config.default_uid, 1000);
        assert_eq!(config.spawn_connect_retries, 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppMgrConfig::from_json(r#"{"version": 9}"#),
            Err(ConfigError::UnsupportedVersion(9))
        ));
        assert!(matches!(
            AppMgrConfig::from_json(r#"{"so_path": ""}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppMgrConfig::from_json(r#"{"max_recent_apps": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppMgrConfig::from_json(r#"{"default_uid": -1}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppMgrConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appmgr.json");
        let config = AppMgrConfig {
            max_recent_apps: 3,
            ..AppMgrConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppMgrConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppMgrConfig::load(dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
