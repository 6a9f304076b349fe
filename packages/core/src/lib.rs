//! ENCODE Metadata Upgrade Layer
//!
//! This crate upgrades stored metadata items from the schema version they
//! were written at to the version the application currently expects.
//!
//! # Architecture
//!
//! - **Versioned Items**: Every item carries `schema_version` in its properties
//! - **Explicit Registry**: Upgrade steps are registered per
//!   `(item_type, source, dest)` into a registry the caller owns
//! - **In-Place Steps**: Steps mutate the record; the registry bumps the version
//!
//! # Modules
//!
//! - [`models`] - Items, records and schema version tags
//! - [`services`] - Upgrade registry and the concrete upgrade steps
//! - [`config`] - Registry settings
//! - [`utils`] - Helpers shared by upgrade steps

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ErrorPolicy, UpgradeConfig};
pub use models::*;
pub use services::*;

/// Registry with every shipped upgrade step registered
pub fn default_registry(config: UpgradeConfig) -> UpgradeRegistry {
    let mut registry = UpgradeRegistry::with_config(config);
    services::upgrades::register_all(&mut registry);
    registry
}
