use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timeout used when a caller does not pass one.
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

/// Selector configuration, fixed once the manager is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Timeout applied when an operation is called without one.
    pub default_timeout_ms: u64,
    /// Append the debug-only backend at the lowest priority.
    pub include_debug_backend: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            include_debug_backend: false,
        }
    }
}

impl ManagerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Parse configuration JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration JSON from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ManagerConfig::from_json("{}").expect("empty config should parse");
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.default_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn fields_override_defaults() {
        let config = ManagerConfig::from_json(
            r#"{"default_timeout_ms": 400, "include_debug_backend": true}"#,
        )
        .expect("config should parse");
        assert_eq!(config.default_timeout_ms, 400);
        assert!(config.include_debug_backend);
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = ManagerConfig::from_json(r#"{"timeout": 1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ManagerConfig::load("/nonexistent/auxswitch.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/auxswitch.json"));
    }
}
