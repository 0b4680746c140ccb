//! Suspension module.
//!
//! Per-user temporary bypass of filtering, optionally limited to a scope.

pub mod table;

pub use table::*;
