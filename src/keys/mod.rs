//! Key (allow-rule) module.
//!
//! A key pairs a locator matcher with an app scope:
//! - Domain, any-subdomain, wildcard domain, path and IP matchers
//! - Scopes: any app, web browsers only, one named app

pub mod domain;
pub mod key;
pub mod path;
pub mod scope;

pub use domain::*;
pub use key::*;
pub use path::*;
pub use scope::*;
