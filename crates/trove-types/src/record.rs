use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// A stored record: a key plus named properties.
///
/// `Record` is the unit exchanged with the storage boundary. A property that
/// is absent from `properties` was never written, which is different from a
/// property holding [`Value::Null`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub properties: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with no properties.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Insert a property, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
