//! Rules-sync boundary.
//!
//! Decodes rule updates from the controlling app:
//! - Per-user key sets (validated and compiled here)
//! - App-identity manifest
//! - Suspension set/revoke and exempt-user updates
//!
//! Malformed or unknown key variants are rejected here and never reach
//! evaluation.

pub mod error;
pub mod message;

pub use error::*;
pub use message::*;
