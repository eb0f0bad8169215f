//! Pipeline module - Materialize, route, mutate and register, per object.

mod error;
mod pipeline;

#[cfg(test)]
mod scenario_test;

pub use error::*;
pub use pipeline::*;
