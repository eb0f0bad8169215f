//! Object module - Rendered manifests as handed over by the chart renderer.

mod rendered;

pub use rendered::*;
