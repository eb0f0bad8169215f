//! Field path module - Addresses locations inside a rendered object.
//!
//! Maps are addressed by field name and lists by position, which is what a
//! replace-style patch needs to land on the intended element.

mod path;

pub use path::*;
