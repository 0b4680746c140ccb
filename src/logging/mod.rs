//! Structured logging with flow context.
//!
//! Provides logging macros and utilities that include the user id and the
//! requesting app in every log message for easy correlation.

pub mod structured;

pub use structured::*;
