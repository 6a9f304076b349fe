//! Schema Upgrade Registry
//!
//! This module provides the registry that upgrades stored items from the
//! schema version they were written at to the version the application
//! currently expects.
//!
//! ## Architecture
//!
//! - **Explicit Registry**: Steps are plain function pointers stored under
//!   `(item_type, source_version, dest_version)`; the caller builds and owns
//!   the registry, there is no process-wide table
//! - **Version Tracking**: Each item carries its version in `schema_version`
//!   (configurable), which the registry rewrites after every step
//! - **In-Place Steps**: A step mutates the record it is handed and returns
//!   `Ok(())`; errors propagate to the caller with type and version context
//! - **Step Chaining**: Steps are followed source → dest until the target
//!   version is reached (v1→v2→v3)
//!
//! ## Example Usage
//!
//! ```
//! # use encoded_upgrade::services::upgrade_registry::{UpgradeContext, UpgradeRegistry};
//! # use encoded_upgrade::services::UpgradeError;
//! # use encoded_upgrade::models::Record;
//! # use serde_json::json;
//! # fn main() -> Result<(), UpgradeError> {
//! fn add_status(record: &mut Record, _ctx: &UpgradeContext<'_>) -> Result<(), UpgradeError> {
//!     record.entry("status").or_insert(json!("released"));
//!     Ok(())
//! }
//!
//! let mut registry = UpgradeRegistry::new();
//! registry.register_type("file", "2");
//! registry.register_step("file", "1", "2", add_status);
//!
//! let mut record = json!({"schema_version": "1"}).as_object().cloned().unwrap();
//! let outcome = registry.upgrade("file", &mut record, None)?;
//!
//! assert_eq!(outcome.steps_applied, 1);
//! assert_eq!(record["schema_version"], "2");
//! assert_eq!(record["status"], "released");
//! # Ok(())
//! # }
//! ```

use crate::config::{ErrorPolicy, UpgradeConfig};
use crate::models::{Item, Record, SchemaVersion};
use crate::services::UpgradeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Type alias for upgrade step functions
///
/// A step receives the record at its source version and mutates it in place.
/// It must not touch the version field: the registry writes the destination
/// version after the step returns `Ok(())`.
pub type UpgradeStep = fn(&mut Record, &UpgradeContext<'_>) -> Result<(), UpgradeError>;

/// System context handed to every upgrade step.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeContext<'a> {
    /// Type of the item being upgraded
    pub item_type: &'a str,
    /// Version the step upgrades from
    pub source: &'a SchemaVersion,
    /// Version the step upgrades to
    pub dest: &'a SchemaVersion,
    /// Final version of the whole upgrade
    pub target: &'a SchemaVersion,
    /// Registry settings
    pub settings: &'a UpgradeConfig,
}

/// Result of upgrading a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOutcome {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub steps_applied: usize,
}

impl UpgradeOutcome {
    /// True when the record was already at the target version
    pub fn is_noop(&self) -> bool {
        self.steps_applied == 0
    }
}

/// One failed item in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position of the item in the batch
    pub index: usize,
    /// The item's uuid, or its type when it has none
    pub label: String,
    pub item_type: String,
    pub error: String,
}

/// Summary of an [`UpgradeRegistry::upgrade_batch`] run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Items that had at least one step applied
    pub upgraded: usize,
    /// Batch positions of the upgraded items, ascending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upgraded_items: Vec<usize>,
    /// Items already at their target version
    pub unchanged: usize,
    pub failures: Vec<BatchFailure>,
    /// True when the batch stopped early under [`ErrorPolicy::Abort`]
    pub aborted: bool,
}

impl BatchReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            upgraded: 0,
            upgraded_items: Vec::new(),
            unchanged: 0,
            failures: Vec::new(),
            aborted: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the item at `index` had steps applied (and kept them)
    pub fn is_upgraded(&self, index: usize) -> bool {
        self.upgraded_items.binary_search(&index).is_ok()
    }
}

/// Registry for schema upgrade steps
///
/// Stores upgrade functions keyed by (item_type, source_version, dest_version)
/// together with the current schema version of each registered item type.
///
/// # Example
///
/// ```ignore
/// let mut registry = UpgradeRegistry::new();
///
/// registry.register_type("file", "3");
/// registry.register_step("file", "1", "2", file_1_2);
/// registry.register_step("file", "2", "3", file_2_3);
///
/// // Chained upgrade (v1→v2→v3)
/// registry.upgrade_item(&mut item)?;
/// ```
pub struct UpgradeRegistry {
    /// Map of (item_type, source_version, dest_version) → step function
    steps: HashMap<(String, SchemaVersion, SchemaVersion), UpgradeStep>,
    /// Map of item_type → version new items are written at
    current_versions: HashMap<String, SchemaVersion>,
    config: UpgradeConfig,
}

impl UpgradeRegistry {
    /// Create a new empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(UpgradeConfig::default())
    }

    /// Create a new empty registry with the given settings
    pub fn with_config(config: UpgradeConfig) -> Self {
        Self {
            steps: HashMap::new(),
            current_versions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &UpgradeConfig {
        &self.config
    }

    /// Declare the schema version `item_type` is upgraded to by default
    pub fn register_type(
        &mut self,
        item_type: impl Into<String>,
        current_version: impl Into<SchemaVersion>,
    ) {
        self.current_versions
            .insert(item_type.into(), current_version.into());
    }

    /// Register an upgrade step for a schema version transition
    ///
    /// A type has at most one step leaving any given source version; a later
    /// registration for the same `(item_type, source)` replaces the earlier one.
    pub fn register_step(
        &mut self,
        item_type: impl Into<String>,
        source: impl Into<SchemaVersion>,
        dest: impl Into<SchemaVersion>,
        step: UpgradeStep,
    ) {
        let item_type = item_type.into();
        let source = source.into();
        let dest = dest.into();

        let replaced = self.steps.len();
        self.steps
            .retain(|(t, s, _), _| !(t == &item_type && s == &source));
        if self.steps.len() != replaced {
            debug!(%item_type, %source, "Replacing previously registered upgrade step");
        }

        self.steps.insert((item_type, source, dest), step);
    }

    /// The version `item_type` upgrades to by default
    pub fn current_version(&self, item_type: &str) -> Option<&SchemaVersion> {
        self.current_versions.get(item_type)
    }

    /// Get the number of registered steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn next_step(
        &self,
        item_type: &str,
        source: &SchemaVersion,
    ) -> Option<(&SchemaVersion, UpgradeStep)> {
        self.steps
            .iter()
            .find(|((t, s, _), _)| t == item_type && s == source)
            .map(|((_, _, dest), step)| (dest, *step))
    }

    /// Check if registered steps lead from one version to another
    ///
    /// Returns `true` when `from == to`, `false` when `from` is newer.
    pub fn has_upgrade_path(
        &self,
        item_type: &str,
        from: impl Into<SchemaVersion>,
        to: impl Into<SchemaVersion>,
    ) -> bool {
        let to = to.into();
        let mut current = from.into();

        while current < to {
            match self.next_step(item_type, &current) {
                Some((dest, _)) if dest > &current && dest <= &to => current = dest.clone(),
                _ => return false,
            }
        }

        current == to
    }

    /// Upgrade a record of `item_type` in place
    ///
    /// The current version is read from the configured version field, falling
    /// back to `default_source_version` when the field is absent. `target`
    /// defaults to the type's registered current version.
    ///
    /// # Errors
    ///
    /// - `UnknownType`: no target given and the type was never registered
    /// - `InvalidRecord`: the version field holds neither a string nor an integer
    /// - `VersionTooHigh`: the record is newer than the target
    /// - `NoUpgradePath`: the registered steps do not reach the target
    /// - `StepFailed`: a step returned an error; the record keeps the changes
    ///   of the steps that succeeded before it
    pub fn upgrade(
        &self,
        item_type: &str,
        record: &mut Record,
        target: Option<&SchemaVersion>,
    ) -> Result<UpgradeOutcome, UpgradeError> {
        let target = match target {
            Some(target) => target.clone(),
            None => self
                .current_version(item_type)
                .cloned()
                .ok_or_else(|| UpgradeError::unknown_type(item_type))?,
        };

        let version_field = self.config.version_field.as_str();
        let from = match record.get(version_field) {
            None => self.config.default_source_version.clone(),
            Some(value) => SchemaVersion::from_value(value).ok_or_else(|| {
                UpgradeError::invalid_record(format!(
                    "{} has a malformed '{}': {}",
                    item_type, version_field, value
                ))
            })?,
        };

        if from > target {
            return Err(UpgradeError::VersionTooHigh {
                item_type: item_type.to_string(),
                current: from,
                target,
            });
        }

        let mut current = from.clone();
        let mut steps_applied = 0;

        while current != target {
            let (dest, step) = self
                .next_step(item_type, &current)
                .filter(|(dest, _)| *dest > &current && *dest <= &target)
                .ok_or_else(|| {
                    UpgradeError::no_upgrade_path(item_type, from.clone(), target.clone())
                })?;

            let ctx = UpgradeContext {
                item_type,
                source: &current,
                dest,
                target: &target,
                settings: &self.config,
            };

            step(record, &ctx).map_err(|cause| UpgradeError::StepFailed {
                item_type: item_type.to_string(),
                source_version: current.clone(),
                dest_version: dest.clone(),
                cause: Box::new(cause),
            })?;

            record.insert(version_field.to_string(), dest.to_value());
            debug!(item_type, source = %current, dest = %dest, "Applied upgrade step");

            current = dest.clone();
            steps_applied += 1;
        }

        trace!(item_type, %from, to = %target, steps_applied, "Upgrade complete");

        Ok(UpgradeOutcome {
            from,
            to: target,
            steps_applied,
        })
    }

    /// Upgrade an item to its type's current version
    pub fn upgrade_item(&self, item: &mut Item) -> Result<UpgradeOutcome, UpgradeError> {
        self.upgrade_item_to(item, None)
    }

    /// Upgrade an item to `target`, or to its type's current version
    pub fn upgrade_item_to(
        &self,
        item: &mut Item,
        target: Option<&SchemaVersion>,
    ) -> Result<UpgradeOutcome, UpgradeError> {
        let Item {
            item_type,
            properties,
            ..
        } = item;

        let record = properties.as_object_mut().ok_or_else(|| {
            UpgradeError::invalid_record(format!("{} properties are not a JSON object", item_type))
        })?;

        self.upgrade(item_type, record, target)
    }

    /// Upgrade every item in `items` to its type's current version
    ///
    /// Failed items are restored to their original contents. Under
    /// [`ErrorPolicy::Abort`] the batch stops at the first failure and the
    /// remaining items are left alone; under [`ErrorPolicy::Skip`] every
    /// item is attempted.
    pub fn upgrade_batch(&self, items: &mut [Item]) -> BatchReport {
        self.upgrade_batch_to(items, None)
    }

    /// Like [`upgrade_batch`](Self::upgrade_batch) with an explicit target
    pub fn upgrade_batch_to(
        &self,
        items: &mut [Item],
        target: Option<&SchemaVersion>,
    ) -> BatchReport {
        let mut report = BatchReport::start();

        for (index, item) in items.iter_mut().enumerate() {
            let original = item.clone();

            match self.upgrade_item_to(item, target) {
                Ok(outcome) if outcome.is_noop() => report.unchanged += 1,
                Ok(_) => {
                    report.upgraded += 1;
                    report.upgraded_items.push(index);
                }
                Err(err) => {
                    warn!(index, item = item.label(), error = %err, "Item upgrade failed");
                    *item = original;
                    report.failures.push(BatchFailure {
                        index,
                        label: item.label().to_string(),
                        item_type: item.item_type.clone(),
                        error: err.to_string(),
                    });

                    if self.config.on_error == ErrorPolicy::Abort {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        report
    }
}

impl Default for UpgradeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
