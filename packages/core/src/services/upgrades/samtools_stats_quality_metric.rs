//! samtools stats Quality Metric Upgrades
//!
//! ## Upgrade History
//!
//! - **v1 → v2**: `aliases` and `quality_metric_of` are sets; repeated
//!   entries written by earlier importers are removed (redmine #3063)

use crate::models::{Record, SchemaVersion};
use crate::services::upgrade_registry::{UpgradeContext, UpgradeRegistry};
use crate::services::UpgradeError;
use crate::utils::dedupe_field;

pub const ITEM_TYPE: &str = "samtools_stats_quality_metric";

/// Version new quality metrics are written at
pub const CURRENT_VERSION: &str = "2";

/// Register all samtools stats quality metric upgrades
pub fn register_upgrades(registry: &mut UpgradeRegistry) {
    registry.register_type(ITEM_TYPE, SchemaVersion::from(CURRENT_VERSION));
    registry.register_step(ITEM_TYPE, "1", "2", upgrade_v1_to_v2);
}

/// Upgrade v1 → v2: deduplicate set-valued fields
///
/// # Schema Changes
///
/// - Modified: `aliases` holds each alias once
/// - Modified: `quality_metric_of` holds each referenced file once
///
/// Absent fields stay absent. Remaining elements keep first-seen order.
///
/// # Example
///
/// **Before (v1):**
/// ```json
/// {
///   "schema_version": "1",
///   "aliases": ["lab:qc-1", "lab:qc-1"],
///   "quality_metric_of": ["ENCFF001ABC"]
/// }
/// ```
///
/// **After (v2):**
/// ```json
/// {
///   "schema_version": "2",
///   "aliases": ["lab:qc-1"],
///   "quality_metric_of": ["ENCFF001ABC"]
/// }
/// ```
pub fn upgrade_v1_to_v2(record: &mut Record, _ctx: &UpgradeContext<'_>) -> Result<(), UpgradeError> {
    dedupe_field(record, "aliases")?;
    dedupe_field(record, "quality_metric_of")?;
    Ok(())
}
