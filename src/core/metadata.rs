//! Structured key-value metadata attached to each log entry
//!
//! Values are arbitrary JSON: scalars, arrays and nested objects are all
//! accepted and shipped verbatim inside the log line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Ordered metadata for one log entry
///
/// Keys keep their insertion order; setting an existing key replaces its value.
///
/// # Example
///
/// ```
/// use loki_shipper::Metadata;
///
/// let meta = Metadata::new()
///     .with_field("method", "GET")
///     .with_field("status", 200)
///     .with_field("duration_ms", 12.5);
///
/// assert_eq!(meta.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: Map<String, Value>,
}

impl Metadata {
    /// Create an empty metadata map
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Add a field (builder form)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field in place
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Copy every field into `target`, replacing keys that already exist there
    pub fn merge_into(&self, target: &mut Map<String, Value>) {
        for (key, value) in &self.fields {
            target.insert(key.clone(), value.clone());
        }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
