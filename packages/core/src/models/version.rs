//! Schema version tags
//!
//! Items store their schema version as a string (`"1"`, `"2"`, `"10"`), so
//! ordering cannot be plain string ordering: `"10"` must sort after `"9"`.
//! [`SchemaVersion`] keeps the original tag and compares it component-wise.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A schema version tag such as `"1"` or `"2.1"`.
///
/// Ordering splits the tag on `.` and compares each component numerically
/// when both sides are numbers, lexically otherwise. Numeric components sort
/// before non-numeric ones, and the empty tag sorts before everything.
/// Tags that compare equal component-wise (`"01"` and `"1"`) are ordered by
/// their raw text so that `Ord` agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a version tag out of a stored JSON value.
    ///
    /// Accepts strings and non-negative integers (older items sometimes carry
    /// `"schema_version": 1`). Anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => n.as_u64().map(|n| Self(n.to_string())),
            _ => None,
        }
    }

    /// The tag as it is written back into an item.
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|c| !c.is_empty())
    }
}

fn compare_component(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.components();
        let mut rhs = other.components();
        loop {
            match (lhs.next(), rhs.next()) {
                (Some(a), Some(b)) => match compare_component(a, b) {
                    Ordering::Equal => continue,
                    ord => return ord,
                },
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => return self.0.cmp(&other.0),
            }
        }
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for SchemaVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SchemaVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}
