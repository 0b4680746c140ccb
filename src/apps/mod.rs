//! App identity module.
//!
//! Maps a requesting app's bundle id to what the scope rules need to know
//! about it: is it a web browser, and which app slug identifies it.

pub mod identity;
pub mod manifest;

pub use identity::*;
pub use manifest::*;
