//! Key attributes attached to protected values
//!
//! Attributes are an ordered map from attribute name to a list of string
//! values (e.g. `{"classification": ["pii"], "department": ["HR"]}`).
//! Access rules are evaluated against them when a key is requested.

use crate::error::{Result, RowguardError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered attribute map bound to a data key at creation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyAttributes(IndexMap<String, Vec<String>>);

impl KeyAttributes {
    /// Create an empty attribute map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object whose values are arrays of strings
    ///
    /// Any other value shape is rejected rather than skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        // `Value::Object` does not keep document order; re-read into an IndexMap
        if !value.is_object() {
            return Err(RowguardError::Attributes(format!(
                "expected a JSON object, got {}",
                kind(&value)
            )));
        }
        let object: IndexMap<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut attributes = Self::new();
        for (name, value) in object {
            let array = value.as_array().ok_or_else(|| {
                RowguardError::Attributes(format!(
                    "attribute '{}' must be an array of strings, got {}",
                    name,
                    kind(&value)
                ))
            })?;
            let mut values = Vec::with_capacity(array.len());
            for item in array {
                let text = item.as_str().ok_or_else(|| {
                    RowguardError::Attributes(format!(
                        "attribute '{}' contains a non-string element ({})",
                        name,
                        kind(item)
                    ))
                })?;
                values.push(text.to_string());
            }
            attributes.0.insert(name, values);
        }
        Ok(attributes)
    }

    /// Set an attribute, replacing any previous values
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.insert(name.into(), values);
    }

    /// Builder form of `insert` for a single value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, vec![value.into()]);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Copy every attribute from `other`; entries in `other` win
    pub fn merge(&mut self, other: &KeyAttributes) {
        for (name, values) in &other.0 {
            self.0.insert(name.clone(), values.clone());
        }
    }

    /// True if attribute `name` carries at least one of `values`
    pub fn matches_any(&self, name: &str, values: &[String]) -> bool {
        self.get(name)
            .map(|own| own.iter().any(|v| values.contains(v)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for KeyAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
