//! Typed materialization through a group/version/kind registry.

use super::{Materialized, MaterializeError, Materializer, MaterializedView};
use crate::object::{GroupVersionKind, RenderedObject};
use crate::value::Value;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::Resource;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;

/// TypedResource is a decoded API object of one of the registered types.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedResource {
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
    DaemonSet(Box<DaemonSet>),
}

impl TypedResource {
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            TypedResource::Deployment(d) => &d.metadata,
            TypedResource::StatefulSet(s) => &s.metadata,
            TypedResource::DaemonSet(d) => &d.metadata,
        }
    }

    /// Returns the pod template, if the object has a spec.
    pub fn pod_template(&self) -> Option<&PodTemplateSpec> {
        match self {
            TypedResource::Deployment(d) => d.spec.as_ref().map(|s| &s.template),
            TypedResource::StatefulSet(s) => s.spec.as_ref().map(|s| &s.template),
            TypedResource::DaemonSet(d) => d.spec.as_ref().map(|s| &s.template),
        }
    }
}

/// TypedObject is a decoded resource and the tree it was decoded from.
///
/// The resource identifies the kind and locates fields. Values that end up in
/// patches are read from the tree, which keeps fields the structs do not model.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedObject {
    pub resource: TypedResource,
    pub tree: Value,
}

/// Decoder turns canonical bytes into a typed resource.
pub type Decoder = fn(&[u8]) -> Result<TypedResource, serde_json::Error>;

/// Returns the group/version/kind a k8s-openapi type is served under.
pub fn gvk_of<K: Resource>() -> GroupVersionKind {
    GroupVersionKind::new(K::GROUP, K::VERSION, K::KIND)
}

/// TypeRegistry maps group/version/kind to a decoder.
///
/// The lookup index is built on first use, so a registry should be treated
/// as immutable once it is handed to a materializer.
#[derive(Default)]
pub struct TypeRegistry {
    registrations: Vec<(GroupVersionKind, Decoder)>,
    index: OnceCell<HashMap<GroupVersionKind, Decoder>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Creates a registry with the workload types of the `apps/v1` group.
    pub fn kubernetes() -> Self {
        TypeRegistry::new()
            .with(gvk_of::<Deployment>(), |bytes| {
                serde_json::from_slice(bytes).map(|d| TypedResource::Deployment(Box::new(d)))
            })
            .with(gvk_of::<StatefulSet>(), |bytes| {
                serde_json::from_slice(bytes).map(|s| TypedResource::StatefulSet(Box::new(s)))
            })
            .with(gvk_of::<DaemonSet>(), |bytes| {
                serde_json::from_slice(bytes).map(|d| TypedResource::DaemonSet(Box::new(d)))
            })
    }

    /// Adds a registration. A later registration for the same
    /// group/version/kind replaces an earlier one.
    pub fn with(mut self, gvk: GroupVersionKind, decoder: Decoder) -> Self {
        self.registrations.push((gvk, decoder));
        self.index = OnceCell::new();
        self
    }

    fn index(&self) -> &HashMap<GroupVersionKind, Decoder> {
        self.index
            .get_or_init(|| self.registrations.iter().cloned().collect())
    }

    /// Returns the decoder registered for `gvk`.
    pub fn lookup(&self, gvk: &GroupVersionKind) -> Option<Decoder> {
        self.index().get(gvk).copied()
    }

    pub fn is_registered(&self, gvk: &GroupVersionKind) -> bool {
        self.index().contains_key(gvk)
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Returns the registered types in a stable order.
    pub fn kinds(&self) -> Vec<&GroupVersionKind> {
        let mut kinds: Vec<_> = self.index().keys().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// TypedMaterializer decodes registered kinds into k8s-openapi structs.
#[derive(Debug)]
pub struct TypedMaterializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> TypedMaterializer<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        TypedMaterializer { registry }
    }
}

impl Materializer for TypedMaterializer<'_> {
    fn materialize(&self, object: &RenderedObject) -> Result<Materialized, MaterializeError> {
        let gvk = object.group_version_kind();
        let Some(decode) = self.registry.lookup(&gvk) else {
            return Ok(Materialized::unrecognized(gvk.kind));
        };

        let bytes = object
            .to_canonical_bytes()
            .map_err(MaterializeError::Serialization)?;
        let resource = decode(&bytes).map_err(|source| MaterializeError::Decode {
            gvk: gvk.clone(),
            source,
        })?;
        let tree = Value::from_slice(&bytes).map_err(MaterializeError::Serialization)?;

        Ok(Materialized::new(
            gvk.kind,
            MaterializedView::Typed(TypedObject { resource, tree }),
        ))
    }
}
