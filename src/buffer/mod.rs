//! Decision buffer module.
//!
//! Compresses bursts of identical decisions into counted entries before
//! they are reported upstream.

pub mod decision_buffer;

pub use decision_buffer::*;
