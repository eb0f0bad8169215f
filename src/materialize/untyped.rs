//! Untyped materialization into the generic value tree.

use super::{Materialized, MaterializeError, Materializer, MaterializedView};
use crate::object::RenderedObject;
use crate::value::Value;

/// UntypedMaterializer projects any object into a [`Value`] tree.
///
/// Every kind materializes; whether anything gets mutated is decided by the
/// router and the rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntypedMaterializer;

impl Materializer for UntypedMaterializer {
    fn materialize(&self, object: &RenderedObject) -> Result<Materialized, MaterializeError> {
        let bytes = object
            .to_canonical_bytes()
            .map_err(MaterializeError::Serialization)?;
        let tree = Value::from_slice(&bytes).map_err(MaterializeError::Serialization)?;
        Ok(Materialized::new(object.kind(), MaterializedView::Untyped(tree)))
    }
}
