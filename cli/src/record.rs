//! Schema-less command records for registry-defined commands.
//!
//! Registry commands have no Rust type of their own, so every command binds
//! into a [`Record`]: a set of named values that serializes to a flat JSON
//! object. Only fields that received a value appear in the output.

use std::collections::BTreeMap;

use serde::Serialize;

/// One scalar value bound from input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A bound command record.
///
/// Each field lives in the map matching its shape; field names are unique
/// across maps because a registry field has exactly one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    scalars: BTreeMap<String, Scalar>,
    #[serde(flatten)]
    nested: BTreeMap<String, Record>,
    #[serde(flatten)]
    lists: BTreeMap<String, Vec<Scalar>>,
    #[serde(flatten)]
    nested_lists: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn set(&mut self, field: &str, value: Scalar) {
        self.scalars.insert(field.to_string(), value);
    }

    pub fn push(&mut self, field: &str, value: Scalar) {
        self.lists.entry(field.to_string()).or_default().push(value);
    }

    /// Nested record for `field`, created empty on first access.
    pub fn nested_mut(&mut self, field: &str) -> &mut Record {
        self.nested.entry(field.to_string()).or_default()
    }

    pub fn push_nested(&mut self, field: &str, record: Record) {
        self.nested_lists
            .entry(field.to_string())
            .or_default()
            .push(record);
    }
}
