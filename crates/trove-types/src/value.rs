use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::Key;

/// Discriminator for [`Value`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Double,
    String,
    Timestamp,
    Blob,
    Key,
    List,
    Map,
}

impl ValueType {
    /// Returns `true` for the container variants.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Map)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Blob => "blob",
            Self::Key => "key",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// A value as stored by the backing datastore.
///
/// `Null` is a present-but-null value. A property that is not stored at all
/// has no `Value`; callers model that as `Option<&Value>` being `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Blob(Bytes),
    Key(Key),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::Timestamp(_) => ValueType::Timestamp,
            Self::Blob(_) => ValueType::Blob,
            Self::Key(_) => ValueType::Key,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Doubles, with integers widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Self::Key(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Blob(v) => write!(f, "blob({})", hex::encode(v)),
            Self::Key(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (name, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Key> for Value {
    fn from(v: Key) -> Self {
        Self::Key(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Blob(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators() {
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(Value::from(3i64).value_type(), ValueType::Int);
        assert_eq!(Value::List(vec![]).value_type(), ValueType::List);
        assert_eq!(Value::Map(BTreeMap::new()).value_type(), ValueType::Map);
        assert!(ValueType::List.is_container());
        assert!(!ValueType::Key.is_container());
    }

    #[test]
    fn accessors_reject_other_variants() {
        let v = Value::from("text");
        assert_eq!(v.as_str(), Some("text"));
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_list(), None);
        assert!(!v.is_null());
    }

    #[test]
    fn int_widens_to_double() {
        assert_eq!(Value::Int(3).as_double(), Some(3.0));
        assert_eq!(Value::Double(2.5).as_double(), Some(2.5));
    }

    #[test]
    fn display_nested() {
        let mut map = BTreeMap::new();
        map.insert("tags".to_string(), Value::List(vec!["a".into(), "b".into()]));
        map.insert("n".to_string(), Value::Int(1));
        assert_eq!(Value::Map(map).to_string(), "{n: 1, tags: [\"a\", \"b\"]}");
        assert_eq!(Value::Blob(Bytes::from_static(&[0xab, 0x01])).to_string(), "blob(ab01)");
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":7}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(7));

        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, r#"{"type":"null"}"#);
    }
}
