//! Registration of patches against object identities.

use super::apply::{apply_patches, ApplyError};
use super::operation::PatchOperation;
use crate::fieldpath::Path;
use crate::object::{ObjectIdentity, RenderedObject};
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Registration is the ordered patch list of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registration {
    pub identity: ObjectIdentity,
    pub patches: Vec<PatchOperation>,
}

/// Registrations collects the patches of a whole run, in the order objects
/// were first seen.
///
/// Nothing is checked for overlap: when two operations target the same path
/// the one registered last wins at apply time.
#[derive(Debug, Clone, Default)]
pub struct Registrations {
    entries: Vec<Registration>,
    index: HashMap<ObjectIdentity, usize>,
}

impl Registrations {
    pub fn new() -> Self {
        Registrations::default()
    }

    /// Ensures `identity` has an entry, possibly empty, and returns it.
    pub fn track(&mut self, identity: &ObjectIdentity) -> &mut Registration {
        let i = match self.index.get(identity) {
            Some(&i) => i,
            None => {
                self.entries.push(Registration {
                    identity: identity.clone(),
                    patches: Vec::new(),
                });
                self.index.insert(identity.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i]
    }

    /// Reports whether `identity` has an entry.
    pub fn contains(&self, identity: &ObjectIdentity) -> bool {
        self.index.contains_key(identity)
    }

    /// Registers a replace of `path` with `value` against `object`.
    pub fn register_patch(&mut self, object: &RenderedObject, path: Path, value: Value) {
        self.register(&object.identity(), PatchOperation::replace(path, value));
    }

    /// Appends an operation to the patch list of `identity`.
    pub fn register(&mut self, identity: &ObjectIdentity, operation: PatchOperation) {
        debug!(object = %identity, path = %operation.path, "Registering patch");
        self.track(identity).patches.push(operation);
    }

    /// Returns the patches registered for `identity`, empty when none.
    pub fn patches_for(&self, identity: &ObjectIdentity) -> &[PatchOperation] {
        self.index
            .get(identity)
            .map(|&i| self.entries[i].patches.as_slice())
            .unwrap_or_default()
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of operations across all objects.
    pub fn patch_count(&self) -> usize {
        self.entries.iter().map(|r| r.patches.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// Returns `object` with its registered patches applied.
    pub fn apply(&self, object: &RenderedObject) -> Result<Value, ApplyError> {
        let mut doc = Value::from_serializable(object.document())
            .map_err(|e| ApplyError::Document(e.to_string()))?;
        apply_patches(&mut doc, self.patches_for(&object.identity()))?;
        Ok(doc)
    }
}

impl IntoIterator for Registrations {
    type Item = Registration;
    type IntoIter = std::vec::IntoIter<Registration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
