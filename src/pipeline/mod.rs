//! Filter pipeline module.
//!
//! Coordinates evaluation at the flow-interception boundary:
//! 1. User-id phase against exemptions and suspensions
//! 2. Flow phase against the user's current keys
//! 3. Reporting: skip, report immediately, or buffer
//! 4. Applying rule updates from the sync channel

pub mod engine;
pub mod reporter;
pub mod state;

pub use engine::*;
pub use reporter::*;
pub use state::*;
