//! Applying replace operations to a value tree.

use super::operation::{Op, PatchOperation};
use crate::fieldpath::{Path, PathElement};
use crate::value::Value;
use thiserror::Error;

/// ApplyError is returned when an operation cannot land on the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("{path}: parent {parent} does not exist")]
    MissingParent { path: String, parent: String },

    #[error("{path}: index {index} out of range for list of length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("{path}: cannot address {element} inside {found}")]
    TypeMismatch {
        path: String,
        element: String,
        found: &'static str,
    },

    #[error("document cannot be read as a tree: {0}")]
    Document(String),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Int(_) | Value::UInt(_) => "int",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}

/// Applies one operation.
///
/// A replace needs its parent to exist. Inside a map the field is set even
/// when it was absent, so replacing `metadata.annotations` works on objects
/// without annotations. Inside a list the index must already exist.
pub fn apply_patch(doc: &mut Value, operation: &PatchOperation) -> Result<(), ApplyError> {
    match operation.op {
        Op::Replace => replace(doc, &operation.path, &operation.value),
    }
}

/// Applies operations in order; later operations on the same path win.
pub fn apply_patches(doc: &mut Value, operations: &[PatchOperation]) -> Result<(), ApplyError> {
    operations.iter().try_for_each(|op| apply_patch(doc, op))
}

fn replace(doc: &mut Value, path: &Path, value: &Value) -> Result<(), ApplyError> {
    let Some((parent, last)) = path.split_last() else {
        *doc = value.clone();
        return Ok(());
    };

    let target = doc.lookup_mut(&parent).ok_or_else(|| ApplyError::MissingParent {
        path: path.to_string(),
        parent: parent.to_string(),
    })?;

    match (target, last) {
        (Value::Map(map), PathElement::FieldName(name)) => {
            map.set(name.clone(), value.clone());
            Ok(())
        }
        (Value::List(list), PathElement::Index(i)) => {
            let len = list.len();
            let slot = list.get_mut(*i).ok_or_else(|| ApplyError::IndexOutOfRange {
                path: path.to_string(),
                index: *i,
                len,
            })?;
            *slot = value.clone();
            Ok(())
        }
        (other, element) => Err(ApplyError::TypeMismatch {
            path: path.to_string(),
            element: element.to_string(),
            found: type_name(other),
        }),
    }
}
