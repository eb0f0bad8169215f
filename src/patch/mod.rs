//! Patch module - Replace operations and their registration per object.
//!
//! The synthesis step consumes [`Registrations`] once, applying each object's
//! operations in registration order when it writes the object out.

mod apply;
mod operation;
mod registry;

pub use apply::*;
pub use operation::*;
pub use registry::*;
