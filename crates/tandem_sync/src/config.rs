//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Configuration for sync operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Log every sync step (authority, each copied key, observation changes).
    pub verbose: bool,
    /// Publish the remote store after each batch of writes into it.
    pub publish_on_change: bool,
    /// Name given to the worker thread.
    pub worker_name: String,
}

impl SyncConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            verbose: false,
            publish_on_change: true,
            worker_name: "tandem-sync".into(),
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Enables or disables step-by-step diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enables or disables publishing the remote store after writes.
    pub fn with_publish_on_change(mut self, publish: bool) -> Self {
        self.publish_on_change = publish;
        self
    }

    /// Sets the worker thread name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Checks that the configuration can be used to start an engine.
    pub fn validate(&self) -> SyncResult<()> {
        if self.worker_name.trim().is_empty() {
            return Err(SyncError::Config("worker_name must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_defaults() {
        let config = SyncConfig::default();
        assert!(!config.verbose);
        assert!(config.publish_on_change);
        assert_eq!(config.worker_name, "tandem-sync");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_verbose(true)
            .with_publish_on_change(false)
            .with_worker_name("settings-sync");

        assert!(config.verbose);
        assert!(!config.publish_on_change);
        assert_eq!(config.worker_name, "settings-sync");
    }

    #[test]
    fn sync_config_from_json_partial() {
        let config = SyncConfig::from_json(r#"{"verbose": true}"#).unwrap();
        assert!(config.verbose);
        assert!(config.publish_on_change);
    }

    #[test]
    fn sync_config_from_json_rejects_garbage() {
        assert!(matches!(
            SyncConfig::from_json("{not json"),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            SyncConfig::from_json(r#"{"worker_name": "  "}"#),
            Err(SyncError::Config(_))
        ));
    }
}
