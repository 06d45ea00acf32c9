//! Flat records
//!
//! A `Record` maps unique field names to scalar values. It is what the feed
//! parsers emit, one per repeating element of the source feed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Document, Value};

/// Flat field → scalar mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value if any
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Get a field value
    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field only if it holds a string
    #[inline]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Check whether a field is present
    #[inline]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Merge another record into this one; fields of `other` win
    pub fn merge(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }

    /// Number of fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert to a JSON document
    pub fn to_document(&self) -> Document {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Build a record from the scalar members of a JSON object
    ///
    /// Non-scalar members (arrays, objects, booleans, null) are left out;
    /// their names are returned alongside the record.
    pub fn from_document(document: &Document) -> (Self, Vec<String>) {
        let mut record = Self::new();
        let mut dropped = Vec::new();

        for (field, value) in document {
            match Value::from_json(value) {
                Some(v) => {
                    record.fields.insert(field.clone(), v);
                }
                None => dropped.push(field.clone()),
            }
        }

        (record, dropped)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
