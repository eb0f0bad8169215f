//! # Manifest Patch
//!
//! Patch injection for rendered Kubernetes manifests.
//!
//! Given the objects a chart render produced, this library selects the ones
//! it knows how to mutate, computes field-level changes against them, and
//! expresses those changes as replace operations keyed by object identity.
//! Applying the operations is left to whatever writes the final manifests.
//!
//! ## Modules
//!
//! - [`object`] - Rendered objects and their identity
//! - [`value`] - Generic tree used by the untyped view
//! - [`fieldpath`] - Paths into an object, and their JSON Pointer form
//! - [`materialize`] - Untyped and typed projections of an object
//! - [`mutation`] - Kind routing, rules and their configuration
//! - [`patch`] - Replace operations, their registration and application
//! - [`pipeline`] - Runs the above over a batch of objects

pub mod fieldpath;
pub mod materialize;
pub mod mutation;
pub mod object;
pub mod patch;
pub mod pipeline;
pub mod value;

pub use fieldpath::{Path, PathElement};
pub use materialize::{Materializer, TypeRegistry, TypedMaterializer, UntypedMaterializer};
pub use mutation::{MutationConfig, Rule, WorkloadKind};
pub use object::{GroupVersionKind, ObjectIdentity, RenderedObject};
pub use patch::{PatchOperation, Registrations};
pub use pipeline::{MutateError, Pipeline, Report};
pub use value::Value;
