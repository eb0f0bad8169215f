//! Read access shared by both materialized forms.

use super::typed::TypedObject;
use crate::fieldpath::Path;
use crate::value::{Map, Value};
use once_cell::sync::Lazy;

/// Location of the annotations map.
pub static ANNOTATIONS_PATH: Lazy<Path> = Lazy::new(|| Path::from_fields(["metadata", "annotations"]));

/// Location of the pod template's container list.
pub static CONTAINERS_PATH: Lazy<Path> =
    Lazy::new(|| Path::from_fields(["spec", "template", "spec", "containers"]));

/// ResourceView is what mutation rules read from.
///
/// Both accessors are optional-field tolerant: a missing or mistyped location
/// reads as absent, never as an error.
pub trait ResourceView {
    /// Returns the annotations map, or None when the object declares none.
    fn annotations(&self) -> Option<Map>;

    /// Returns the `env` list of every pod template container, in container
    /// order. A container without a list yields None at its position. The
    /// result is empty when there is no container list at all.
    fn container_envs(&self) -> Vec<Option<Vec<Value>>>;
}

impl ResourceView for Value {
    fn annotations(&self) -> Option<Map> {
        self.nested_map(&ANNOTATIONS_PATH).cloned()
    }

    fn container_envs(&self) -> Vec<Option<Vec<Value>>> {
        let Some(containers) = self.nested_list(&CONTAINERS_PATH) else {
            return Vec::new();
        };
        containers
            .iter()
            .map(|c| c.as_map().and_then(|m| m.get("env")).and_then(Value::as_list).cloned())
            .collect()
    }
}

impl ResourceView for TypedObject {
    fn annotations(&self) -> Option<Map> {
        self.resource
            .metadata()
            .annotations
            .as_ref()
            .map(|a| a.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
    }

    fn container_envs(&self) -> Vec<Option<Vec<Value>>> {
        let Some(pod) = self.resource.pod_template().and_then(|t| t.spec.as_ref()) else {
            return Vec::new();
        };
        pod.containers
            .iter()
            .enumerate()
            .map(|(i, c)| {
                c.env.as_ref()?;
                self.tree
                    .nested_list(&CONTAINERS_PATH.index(i).field("env"))
                    .cloned()
            })
            .collect()
    }
}
