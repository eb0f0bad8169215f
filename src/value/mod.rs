//! Value module - In-memory tree for rendered YAML/JSON objects.
//!
//! This is the untyped view: maps, ordered lists and scalars navigated by
//! explicit path segments.

mod value;

pub use value::*;
