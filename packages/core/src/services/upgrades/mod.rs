//! Schema Upgrade Implementations
//!
//! This module contains the concrete upgrade steps for each item type. Each
//! submodule registers the steps for one type.
//!
//! ## Available Upgrades
//!
//! - `samtools_stats_quality_metric` - Quality metric upgrades (v1→v2)
//!
//! ## Example Usage
//!
//! ```
//! # use encoded_upgrade::services::upgrade_registry::UpgradeRegistry;
//! # use encoded_upgrade::services::upgrades;
//! let mut registry = UpgradeRegistry::new();
//!
//! // Register all upgrades for all item types
//! upgrades::register_all(&mut registry);
//! assert!(registry.has_upgrade_path("samtools_stats_quality_metric", "1", "2"));
//! ```

use crate::services::upgrade_registry::UpgradeRegistry;

pub mod samtools_stats_quality_metric;

/// Register every shipped upgrade step and current type version
pub fn register_all(registry: &mut UpgradeRegistry) {
    samtools_stats_quality_metric::register_upgrades(registry);
}
