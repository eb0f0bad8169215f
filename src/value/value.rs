//! Core value types and navigation.

use crate::fieldpath::{Path, PathElement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value represents a JSON/YAML value that can be any of the supported types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

/// Map represents a key-value map where keys are strings.
///
/// Keys are kept sorted, so serializing a map is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map {
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// Converts any serializable value into a tree.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(value)?)
    }

    /// Parses a tree from canonical JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the value at `path`, or None when any segment is missing or
    /// addresses the wrong container type.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        path.iter().try_fold(self, |current, element| match element {
            PathElement::FieldName(name) => current.as_map()?.get(name),
            PathElement::Index(i) => current.as_list()?.get(*i),
        })
    }

    /// Mutable variant of [`Value::lookup`].
    pub fn lookup_mut(&mut self, path: &Path) -> Option<&mut Value> {
        path.iter().try_fold(self, |current, element| match element {
            PathElement::FieldName(name) => current.as_map_mut()?.get_mut(name),
            PathElement::Index(i) => current.as_list_mut()?.get_mut(*i),
        })
    }

    /// Returns the map at `path` if one is present.
    pub fn nested_map(&self, path: &Path) -> Option<&Map> {
        self.lookup(path)?.as_map()
    }

    /// Returns the list at `path` if one is present.
    ///
    /// A null, a scalar or a map at the location all read as "not found".
    pub fn nested_list(&self, path: &Path) -> Option<&Vec<Value>> {
        self.lookup(path)?.as_list()
    }

    /// Returns the string at `path` if one is present.
    pub fn nested_str(&self, path: &Path) -> Option<&str> {
        self.lookup(path)?.as_str()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl Map {
    pub fn new() -> Self {
        Map {
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Map {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Parse a value from JSON.
pub fn from_json(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a value to JSON.
pub fn to_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Parse a value from YAML.
pub fn from_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Serialize a value to YAML.
pub fn to_yaml(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}
