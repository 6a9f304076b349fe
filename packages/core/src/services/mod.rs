//! Upgrade Services
//!
//! - `UpgradeRegistry` - Step table and version walking for stored items
//! - `upgrades` - Concrete upgrade steps, one submodule per item type
//! - `UpgradeError` - Errors raised by steps and by the registry

pub mod error;
pub mod upgrade_registry;
pub mod upgrades;

pub use error::UpgradeError;
pub use upgrade_registry::{
    BatchFailure, BatchReport, UpgradeContext, UpgradeOutcome, UpgradeRegistry, UpgradeStep,
};
