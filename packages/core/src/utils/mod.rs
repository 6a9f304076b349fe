//! Utility functions shared by upgrade steps

mod set_fields;

pub use set_fields::{dedupe_field, dedupe_values};
