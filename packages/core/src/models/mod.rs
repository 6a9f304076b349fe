//! Data Models
//!
//! - `Item` - Stored metadata item (type name + JSON properties)
//! - `Record` - The property map upgrade steps mutate in place
//! - `SchemaVersion` - Ordered schema version tag

mod item;
mod version;

pub use item::{Item, Record};
pub use version::SchemaVersion;
