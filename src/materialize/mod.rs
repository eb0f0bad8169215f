//! Materialize module - Projects rendered objects into inspectable views.
//!
//! Two interchangeable strategies implement [`Materializer`]:
//!
//! - [`UntypedMaterializer`] - a generic tree for any kind
//! - [`TypedMaterializer`] - k8s-openapi structs for kinds in a [`TypeRegistry`]

mod typed;
mod untyped;
mod view;

pub use typed::*;
pub use untyped::*;
pub use view::*;

use crate::object::{GroupVersionKind, RenderedObject};
use crate::value::{Map, Value};
use thiserror::Error;

/// MaterializedView is a read-only projection of a rendered object.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializedView {
    Untyped(Value),
    Typed(TypedObject),
}

impl ResourceView for MaterializedView {
    fn annotations(&self) -> Option<Map> {
        match self {
            MaterializedView::Untyped(tree) => tree.annotations(),
            MaterializedView::Typed(object) => object.annotations(),
        }
    }

    fn container_envs(&self) -> Vec<Option<Vec<Value>>> {
        match self {
            MaterializedView::Untyped(tree) => tree.container_envs(),
            MaterializedView::Typed(object) => object.container_envs(),
        }
    }
}

/// Materialized pairs an object's kind with its view.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub kind: String,
    /// None when the strategy does not recognize the kind.
    pub view: Option<MaterializedView>,
}

impl Materialized {
    pub fn new(kind: impl Into<String>, view: MaterializedView) -> Self {
        Materialized {
            kind: kind.into(),
            view: Some(view),
        }
    }

    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Materialized {
            kind: kind.into(),
            view: None,
        }
    }
}

/// MaterializeError is a failure to project an object.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to serialize object: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("object does not conform to {gvk}: {source}")]
    Decode {
        gvk: GroupVersionKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Materializer turns a rendered object into a view. It never modifies the
/// object.
pub trait Materializer {
    fn materialize(&self, object: &RenderedObject) -> Result<Materialized, MaterializeError>;
}
