// SPDX-License-Identifier: MIT

//! Per-run state storage
//!
//! A `StateRecord` is the schema-less field map threaded through a single
//! workflow run. Steps read existing fields and return a `StateUpdate`;
//! the executor merges updates key-wise (overwrite), never removing keys.

use serde_json::Value;
use std::collections::HashMap;

use super::error::StepError;

/// Partial update returned by a step body. Keys present here replace the
/// prior value in the record; absent keys are untouched.
pub type StateUpdate = HashMap<String, Value>;

/// The field map for one in-flight run. Each run owns its record
/// exclusively; only the executor mutates it.
#[derive(Debug, Clone, Default)]
pub struct StateRecord {
    fields: HashMap<String, Value>,
}

impl StateRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record seeded with the caller's initial fields
    pub fn with_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Merge a step's partial update: key-wise overwrite, pure and
    /// deterministic. No key is ever removed.
    pub fn merge(&mut self, update: StateUpdate) {
        for (key, value) in update {
            self.fields.insert(key, value);
        }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field as a string slice, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// Get a required field; absence is a precondition violation
    pub fn require(&self, key: &str) -> Result<&Value, StepError> {
        self.fields
            .get(key)
            .ok_or_else(|| StepError::MissingField(key.to_string()))
    }

    /// Get a required string field
    pub fn require_str(&self, key: &str) -> Result<&str, StepError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| StepError::Other(format!("state field '{}' is not a string", key)))
    }

    /// Convert the record to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// All field names currently present
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}
