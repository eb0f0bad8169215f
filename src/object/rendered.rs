//! Rendered objects and their identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GroupVersionKind identifies the API type of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group; empty for the core group.
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        GroupVersionKind {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Splits an `apiVersion` string (`apps/v1`, or `v1` for the core group)
    /// and pairs it with a kind.
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        GroupVersionKind::new(group, version, kind)
    }

    /// Returns the `apiVersion` form of group and version.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// ObjectIdentity is the key patches are registered under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIdentity {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectIdentity {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, namespace: Option<String>) -> Self {
        ObjectIdentity {
            kind: kind.into(),
            name: name.into(),
            namespace,
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// RenderedObject is one resource as the upstream renderer produced it.
///
/// The document is never edited in place; mutations are expressed as patches
/// registered against [`RenderedObject::identity`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    document: serde_json::Value,
}

impl RenderedObject {
    pub fn new(document: serde_json::Value) -> Self {
        RenderedObject { document }
    }

    /// Parses a single JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(RenderedObject::new(serde_json::from_str(json)?))
    }

    /// Splits a multi-document YAML stream, as a chart render prints it, into
    /// objects. Empty documents are skipped.
    pub fn from_yaml_stream(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut objects = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_json::Value::deserialize(document)?;
            if !value.is_null() {
                objects.push(RenderedObject::new(value));
            }
        }
        Ok(objects)
    }

    /// Returns the rendered document.
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    /// Serializes the object to its canonical byte form.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.document)
    }

    fn str_at(&self, pointer: &str) -> &str {
        self.document
            .pointer(pointer)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.str_at("/kind")
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.str_at("/apiVersion"), self.kind())
    }

    pub fn identity(&self) -> ObjectIdentity {
        let namespace = self.str_at("/metadata/namespace");
        ObjectIdentity::new(
            self.kind(),
            self.str_at("/metadata/name"),
            (!namespace.is_empty()).then(|| namespace.to_string()),
        )
    }
}

impl From<serde_json::Value> for RenderedObject {
    fn from(document: serde_json::Value) -> Self {
        RenderedObject::new(document)
    }
}
