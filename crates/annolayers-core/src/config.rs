//! Store and history configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of operations queued while the store is locked.
pub const DEFAULT_PENDING_CAPACITY: usize = 100;

/// Time after which a held lock is reported as stuck.
pub const DEFAULT_STUCK_AFTER_MS: u64 = 5_000;

/// Time after which a held lock is forcibly released.
pub const DEFAULT_RECOVER_AFTER_MS: u64 = 30_000;

/// Maximum number of history entries to keep.
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

/// Layer payload fields compared by reference instead of by content.
pub const DEFAULT_REFERENCE_FIELDS: &[&str] = &["src", "path"];

/// State store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Capacity of the pending-operation queue (oldest dropped on overflow).
    pub pending_capacity: usize,
    /// Stuck-lock detector threshold in milliseconds.
    pub stuck_after_ms: u64,
    /// Forced-recovery threshold in milliseconds.
    pub recover_after_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            stuck_after_ms: DEFAULT_STUCK_AFTER_MS,
            recover_after_ms: DEFAULT_RECOVER_AFTER_MS,
        }
    }
}

impl StoreConfig {
    pub fn stuck_after(&self) -> Duration {
        Duration::from_millis(self.stuck_after_ms)
    }

    pub fn recover_after(&self) -> Duration {
        Duration::from_millis(self.recover_after_ms)
    }

    /// Check the settings for values the store cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pending_capacity == 0 {
            return Err(ConfigError::Invalid(
                "pendingCapacity must be at least 1".to_string(),
            ));
        }
        if self.recover_after_ms < self.stuck_after_ms {
            return Err(ConfigError::Invalid(format!(
                "recoverAfterMs ({}) must not be shorter than stuckAfterMs ({})",
                self.recover_after_ms, self.stuck_after_ms
            )));
        }
        Ok(())
    }
}

/// History engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Hard cap on the number of history entries.
    pub max_history_size: usize,
    /// Payload fields compared by reference in `layers_equal`.
    /// An empty list means every field is compared by content.
    pub reference_fields: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            reference_fields: DEFAULT_REFERENCE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_size == 0 {
            return Err(ConfigError::Invalid(
                "maxHistorySize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for a whole editor session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub store: StoreConfig,
    pub history: HistoryConfig,
}

impl EditorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.history.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.store.pending_capacity, 100);
        assert_eq!(config.store.stuck_after(), Duration::from_secs(5));
        assert_eq!(config.store.recover_after(), Duration::from_secs(30));
        assert_eq!(config.history.max_history_size, 50);
        assert_eq!(config.history.reference_fields, vec!["src", "path"]);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            EditorConfig::from_json(r#"{ "history": { "maxHistorySize": 3 } }"#).unwrap();
        assert_eq!(config.history.max_history_size, 3);
        assert_eq!(config.history.reference_fields, vec!["src", "path"]);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_from_json_rejects_zero_history() {
        let result = EditorConfig::from_json(r#"{ "history": { "maxHistorySize": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_json_rejects_inverted_timers() {
        let result = EditorConfig::from_json(
            r#"{ "store": { "stuckAfterMs": 10000, "recoverAfterMs": 1000 } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_json_parse_error() {
        let result = EditorConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
