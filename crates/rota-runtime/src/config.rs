#![forbid(unsafe_code)]

//! Policy-as-data configuration.
//!
//! Every tunable of the engine — storage directory, history depth, retry
//! bounds, retention window — lives in one [`RotaConfig`] loadable from
//! TOML or JSON at startup. Every field defaults to the value the
//! components use when constructed directly, so `RotaConfig::default()`
//! changes nothing.
//!
//! ```toml
//! # rota.toml
//! storage_dir = "/var/lib/rota"
//!
//! [history]
//! max_depth = 50
//!
//! [retry]
//! max_attempts = 5
//!
//! [retention]
//! keep_days = 180
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::HistoryConfig;
use rota_core::{PersistenceError, RetentionPolicy};
use rota_sync::RetryPolicy;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaConfig {
    /// Directory holding the JSON collection documents.
    pub storage_dir: PathBuf,
    pub history: HistoryConfig,
    pub retry: RetryPolicy,
    pub retention: RetentionPolicy,
}

impl Default for RotaConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("rota-data"),
            history: HistoryConfig::default(),
            retry: RetryPolicy::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl RotaConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, PersistenceError> {
        toml::from_str(text).map_err(|e| PersistenceError::load("config", e))
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PersistenceError::load("config", e))?;
        Self::from_toml_str(&text)
    }

    /// Parse from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(text).map_err(|e| PersistenceError::load("config", e))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_defaults() {
        let config = RotaConfig::default();
        assert_eq!(config.history, HistoryConfig::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.retention, RetentionPolicy::default());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = RotaConfig::from_toml_str("").unwrap();
        assert_eq!(config, RotaConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = RotaConfig::from_toml_str(
            r#"
            storage_dir = "/var/lib/rota"

            [history]
            max_depth = 50

            [retention]
            keep_days = 180
            "#,
        )
        .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/rota"));
        assert_eq!(config.history.max_depth, 50);
        assert_eq!(config.retention.keep_days, 180);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn json_round_trip() {
        let config = RotaConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = RotaConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn malformed_toml_is_a_load_failure() {
        let err = RotaConfig::from_toml_str("storage_dir = [").unwrap_err();
        assert!(matches!(err, PersistenceError::LoadFailed { .. }));
    }
}
