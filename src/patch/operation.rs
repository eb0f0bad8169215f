//! Patch operations.

use crate::fieldpath::Path;
use crate::value::Value;
use serde::{Serialize, Serializer};
use std::fmt;

/// Op is the kind of a patch operation. Only whole-field replacement is
/// emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Replace,
}

/// PatchOperation replaces the value at `path`.
///
/// Paths address the original rendered structure: lists by position, maps by
/// field name. Index addressing assumes the object is not re-rendered between
/// computing the patch and applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: Op,
    pub path: Path,
    pub value: Value,
}

impl PatchOperation {
    /// Creates a replace operation.
    pub fn replace(path: Path, value: impl Into<Value>) -> Self {
        PatchOperation {
            op: Op::Replace,
            path,
            value: value.into(),
        }
    }
}

/// Serializes as an RFC 6902 operation object.
impl Serialize for PatchOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct JsonPatchOperation<'a> {
            op: Op,
            path: String,
            value: &'a Value,
        }

        JsonPatchOperation {
            op: self.op,
            path: self.path.to_json_pointer(),
            value: &self.value,
        }
        .serialize(serializer)
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::Replace => write!(f, "replace {}", self.path),
        }
    }
}
