//! Set-valued fields stored as JSON arrays
//!
//! Several item properties are sets in meaning but arrays on disk. These
//! helpers convert such an array to a set and back, keeping the first
//! occurrence of each element so the result is deterministic.

use crate::models::Record;
use crate::services::UpgradeError;
use serde_json::Value;
use std::collections::HashSet;

/// Objects and arrays cannot be set members.
fn is_hashable(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn check_hashable(field: &str, values: &[Value]) -> Result<(), UpgradeError> {
    match values.iter().position(|v| !is_hashable(v)) {
        Some(index) => Err(UpgradeError::invalid_field(
            field,
            format!("element {} is not a hashable scalar", index),
        )),
        None => Ok(()),
    }
}

/// Keep the first occurrence of each scalar; elements must already be hashable.
fn unique_in_order(values: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_string()))
        .collect()
}

/// Remove repeated elements from `values`, keeping first-seen order.
///
/// Elements must be scalars (strings, numbers, booleans or null); `field` is
/// only used to name the offending field in the error.
pub fn dedupe_values(field: &str, values: Vec<Value>) -> Result<Vec<Value>, UpgradeError> {
    check_hashable(field, &values)?;
    Ok(unique_in_order(values))
}

/// Deduplicate the array stored under `field`, in place.
///
/// Returns `Ok(false)` without touching the record when the field is absent.
/// A present field that is not an array is an error; so is an element that
/// cannot be hashed. On error the field keeps its original value.
pub fn dedupe_field(record: &mut Record, field: &str) -> Result<bool, UpgradeError> {
    let Some(slot) = record.get_mut(field) else {
        return Ok(false);
    };

    let values = match slot {
        Value::Array(values) => values,
        other => {
            return Err(UpgradeError::invalid_field(
                field,
                format!("expected an array, found {}", json_kind(other)),
            ));
        }
    };

    check_hashable(field, values)?;
    let unique = unique_in_order(std::mem::take(values));
    *values = unique;
    Ok(true)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
