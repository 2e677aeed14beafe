//! Transaction manager configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::transaction::error::{TransactionError, TransactionResult};

/// Transaction manager configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionManagerConfig {
    /// Allow NESTED inside an existing transaction (needs savepoints).
    pub nested_transaction_allowed: bool,
    /// Mark the shared transaction rollback-only when a participant fails.
    pub global_rollback_on_participation_failure: bool,
}

impl Default for TransactionManagerConfig {
    fn default() -> Self {
        Self {
            nested_transaction_allowed: false,
            global_rollback_on_participation_failure: true,
        }
    }
}

impl TransactionManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set nested_transaction_allowed flag.
    pub fn nested_transaction_allowed(mut self, value: bool) -> Self {
        self.nested_transaction_allowed = value;
        self
    }

    /// Set global_rollback_on_participation_failure flag.
    pub fn global_rollback_on_participation_failure(mut self, value: bool) -> Self {
        self.global_rollback_on_participation_failure = value;
        self
    }

    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> TransactionResult<Self> {
        serde_json::from_str(json).map_err(|e| TransactionError::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> TransactionResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TransactionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = TransactionManagerConfig::default();
        assert!(!config.nested_transaction_allowed);
        assert!(config.global_rollback_on_participation_failure);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            TransactionManagerConfig::from_json(r#"{"nested_transaction_allowed": true}"#).unwrap();
        assert!(config.nested_transaction_allowed);
        assert!(config.global_rollback_on_participation_failure);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"global_rollback_on_participation_failure": false}}"#).unwrap();

        let config = TransactionManagerConfig::load(file.path()).unwrap();
        assert_eq!(
            config,
            TransactionManagerConfig::new().global_rollback_on_participation_failure(false)
        );
    }

    #[test]
    fn test_invalid_config() {
        let err = TransactionManagerConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, TransactionError::Config(_)));

        let err = TransactionManagerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TransactionError::Config(_)));
    }
}
