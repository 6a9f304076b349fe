//! Upgrade Error Types
//!
//! Errors raised while upgrading items between schema versions. Steps report
//! malformed fields; the registry adds the type and version context and
//! decides nothing about recovery. Batch callers choose whether to abort or
//! skip (see [`crate::config::ErrorPolicy`]).

use crate::models::SchemaVersion;
use thiserror::Error;

/// Upgrade operation errors
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// A field an upgrade step works on holds the wrong kind of value
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The item itself cannot be upgraded (e.g. properties are not an object)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// No current version was registered for this item type
    #[error("Unknown item type: {item_type}")]
    UnknownType { item_type: String },

    /// The item is already past the requested target version
    #[error("{item_type} is at version {current}, newer than target {target}")]
    VersionTooHigh {
        item_type: String,
        current: SchemaVersion,
        target: SchemaVersion,
    },

    /// The registered steps do not connect the current and target versions
    #[error("No upgrade path for {item_type} from version '{from}' to '{to}'")]
    NoUpgradePath {
        item_type: String,
        from: SchemaVersion,
        to: SchemaVersion,
    },

    /// A registered step returned an error
    #[error("Upgrade {item_type} {source_version}->{dest_version} failed: {cause}")]
    StepFailed {
        item_type: String,
        source_version: SchemaVersion,
        dest_version: SchemaVersion,
        cause: Box<UpgradeError>,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration or item JSON could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UpgradeError {
    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create an unknown type error
    pub fn unknown_type(item_type: impl Into<String>) -> Self {
        Self::UnknownType {
            item_type: item_type.into(),
        }
    }

    /// Create a missing upgrade path error
    pub fn no_upgrade_path(
        item_type: impl Into<String>,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> Self {
        Self::NoUpgradePath {
            item_type: item_type.into(),
            from,
            to,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// The innermost error, looking through `StepFailed` wrappers.
    pub fn root_cause(&self) -> &UpgradeError {
        match self {
            Self::StepFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
