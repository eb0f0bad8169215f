//! Mutation module - Kind routing and the rules that compute field changes.

mod config;
mod router;
mod rules;

pub use config::*;
pub use router::*;
pub use rules::*;
