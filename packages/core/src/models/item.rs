//! Stored Item Envelope
//!
//! An [`Item`] is one versioned metadata object as it comes out of storage:
//! its type name plus the JSON object of its properties. Upgrade steps only
//! ever see the properties, as a [`Record`].
//!
//! ```rust
//! use encoded_upgrade::models::Item;
//! use serde_json::json;
//!
//! let item = Item::new(
//!     "samtools_stats_quality_metric",
//!     json!({"schema_version": "1", "aliases": ["lab:qc-1"]}),
//! );
//! assert_eq!(item.schema_version("schema_version").unwrap().as_str(), "1");
//! ```

use super::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of a single item, the unit every upgrade step mutates.
pub type Record = Map<String, Value>;

/// A typed, versioned metadata item.
///
/// # Fields
///
/// - `uuid`: Optional storage identifier, carried through untouched and used
///   when reporting failures
/// - `item_type`: Type name used to select upgrade steps
///   (e.g. `"samtools_stats_quality_metric"`)
/// - `properties`: The item's fields; must be a JSON object to be upgraded
/// - `extra`: Any other envelope keys, kept so they are written back out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    pub item_type: String,

    #[serde(default = "empty_properties")]
    pub properties: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_properties() -> Value {
    Value::Object(Map::new())
}

impl Item {
    pub fn new(item_type: impl Into<String>, properties: Value) -> Self {
        Self {
            uuid: None,
            item_type: item_type.into(),
            properties,
            extra: Map::new(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Schema version stored under `version_field`, if present and well-formed.
    pub fn schema_version(&self, version_field: &str) -> Option<SchemaVersion> {
        self.properties
            .get(version_field)
            .and_then(SchemaVersion::from_value)
    }

    /// Label used in logs and batch reports: the uuid when known, else the type.
    pub fn label(&self) -> &str {
        self.uuid.as_deref().unwrap_or(&self.item_type)
    }
}
