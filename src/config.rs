//! Store configuration.
//!
//! Policies here settle how selections behave when a group disappears or is
//! replaced. Defaults keep every selection, so a group that comes back
//! remembers what was picked.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens to a group's selection keys when it is unregistered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnregisterPolicy {
    /// Keep the keys; re-registering the group restores its selection.
    #[default]
    RetainSelections,
    /// Drop the group's keys together with the group.
    PruneSelections,
}

/// What happens to a group's selection keys when its id is registered again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Keep the keys, even ones the new definition lacks.
    #[default]
    RetainSelections,
    /// Clear the keys before applying the new registration's initial ids.
    ClearSelections,
}

/// Configuration of an [`AggregateStateStore`](crate::store::AggregateStateStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Selection handling on unregister.
    pub unregister_policy: UnregisterPolicy,
    /// Selection handling on re-registration of an existing id.
    pub replace_policy: ReplacePolicy,
    /// Per-watcher buffer of pending change events.
    pub watcher_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            unregister_policy: UnregisterPolicy::default(),
            replace_policy: ReplacePolicy::default(),
            watcher_capacity: 64,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watcher_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watcher_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Sets the unregister policy.
    #[must_use]
    pub fn with_unregister_policy(mut self, policy: UnregisterPolicy) -> Self {
        self.unregister_policy = policy;
        self
    }

    /// Sets the replace policy.
    #[must_use]
    pub fn with_replace_policy(mut self, policy: ReplacePolicy) -> Self {
        self.replace_policy = policy;
        self
    }

    /// Sets the per-watcher buffer capacity.
    #[must_use]
    pub fn with_watcher_capacity(mut self, capacity: usize) -> Self {
        self.watcher_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_retain_selections() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.unregister_policy, UnregisterPolicy::RetainSelections);
        assert_eq!(cfg.replace_policy, ReplacePolicy::RetainSelections);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = StoreConfig::from_json_str(r#"{ "unregister_policy": "prune_selections" }"#).unwrap();
        assert_eq!(cfg.unregister_policy, UnregisterPolicy::PruneSelections);
        assert_eq!(cfg.replace_policy, ReplacePolicy::RetainSelections);
        assert_eq!(cfg.watcher_capacity, 64);
    }

    #[test]
    fn test_from_json_rejects_zero_capacity() {
        let err = StoreConfig::from_json_str(r#"{ "watcher_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_json_rejects_unknown_policy() {
        let err = StoreConfig::from_json_str(r#"{ "replace_policy": "merge" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facets.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "replace_policy": "clear_selections", "watcher_capacity": 8 }}"#).unwrap();

        let cfg = StoreConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.replace_policy, ReplacePolicy::ClearSelections);
        assert_eq!(cfg.watcher_capacity, 8);
    }

    #[test]
    fn test_from_json_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_builders() {
        let cfg = StoreConfig::default()
            .with_unregister_policy(UnregisterPolicy::PruneSelections)
            .with_replace_policy(ReplacePolicy::ClearSelections)
            .with_watcher_capacity(2);
        assert_eq!(cfg.watcher_capacity, 2);
        assert_eq!(cfg.unregister_policy, UnregisterPolicy::PruneSelections);
    }
}
