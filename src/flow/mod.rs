//! Flow descriptor module.
//!
//! Normalized representation of one connection attempt:
//! - Structured descriptor and its port/protocol types
//! - Parsing from OS description text and peeked outbound bytes
//! - Private/reserved address classification
//! - Process token to user id caching

pub mod descriptor;
pub mod network;
pub mod parse;
pub mod user_id;

pub use descriptor::*;
pub use network::*;
pub use user_id::*;
