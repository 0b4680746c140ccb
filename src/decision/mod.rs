//! Decision module.
//!
//! Decides whether a flow is allowed or blocked:
//! - User-id phase (before any flow data)
//! - New-flow phase (may defer for outbound bytes)
//! - Completed-flow phase (always terminal)

pub mod engine;
pub mod reason;

pub use engine::*;
pub use reason::*;
