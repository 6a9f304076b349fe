//! Configuration for the upgrade registry
use crate::models::SchemaVersion;
use crate::services::UpgradeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a batch upgrade does when one item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failing item
    #[default]
    Abort,
    /// Record the failure, leave the item unchanged, continue with the rest
    Skip,
}

/// Configuration for upgrading stored items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Property holding an item's schema version
    pub version_field: String,

    /// Version assumed for items that carry no version field
    pub default_source_version: SchemaVersion,

    /// Batch failure handling
    pub on_error: ErrorPolicy,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            version_field: "schema_version".to_string(),
            default_source_version: SchemaVersion::from("1"),
            on_error: ErrorPolicy::Abort,
        }
    }
}

impl UpgradeConfig {
    /// Load a JSON configuration file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, UpgradeError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), UpgradeError> {
        if self.version_field.trim().is_empty() {
            return Err(UpgradeError::invalid_config("version_field cannot be empty"));
        }

        if self.default_source_version.is_empty() {
            return Err(UpgradeError::invalid_config(
                "default_source_version cannot be empty",
            ));
        }

        Ok(())
    }
}
