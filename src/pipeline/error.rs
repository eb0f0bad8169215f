//! Pipeline errors.

use crate::materialize::MaterializeError;
use crate::object::{GroupVersionKind, ObjectIdentity};
use thiserror::Error;

/// MutateError aborts a run. Each variant names the object that caused it.
#[derive(Debug, Error)]
pub enum MutateError {
    #[error("{identity}: serialization failed: {source}")]
    Serialization {
        identity: ObjectIdentity,
        #[source]
        source: serde_json::Error,
    },

    #[error("{identity}: cannot decode as {gvk}: {source}")]
    Decode {
        identity: ObjectIdentity,
        gvk: GroupVersionKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{identity}: appears more than once in the input; patches are keyed by identity")]
    DuplicateIdentity { identity: ObjectIdentity },
}

impl MutateError {
    /// Attaches the object identity to a materialization failure.
    pub fn materialize(identity: ObjectIdentity, err: MaterializeError) -> Self {
        match err {
            MaterializeError::Serialization(source) => MutateError::Serialization { identity, source },
            MaterializeError::Decode { gvk, source } => MutateError::Decode {
                identity,
                gvk,
                source,
            },
        }
    }

    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            MutateError::Serialization { identity, .. }
            | MutateError::Decode { identity, .. }
            | MutateError::DuplicateIdentity { identity } => identity,
        }
    }
}
