//! Gertrude Filter Core - per-user allow-rule decision engine
//!
//! This crate decides, for every outbound flow on a protected machine,
//! whether it is allowed or blocked and why. The implementation prioritizes:
//!
//! 1. **Fail-closed** - No matching key, no keys, no user id: block
//! 2. **Auditability** - Every decision carries a reason and the key that allowed it
//! 3. **Non-blocking** - Evaluation reads in-memory snapshots only, no I/O
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Engine facade, shared per-user state, reporting seam
//! - `decision` - Pure user-id and flow evaluation
//! - `keys` - Key variants, scopes and locator matchers
//! - `suspension` - Per-user temporary bypasses
//! - `buffer` - Merging decision buffer for upstream reporting
//! - `flow` - Flow descriptor and heuristic flow parsing
//! - `apps` - App identity resolution from the app manifest
//! - `sync` - Rules-sync wire messages and key validation
//! - `logging` - Structured logging with user/app context

pub mod apps;
pub mod buffer;
pub mod config;
pub mod decision;
pub mod flow;
pub mod keys;
pub mod logging;
pub mod pipeline;
pub mod suspension;
pub mod sync;

pub use config::EngineConfig;
pub use decision::{DecisionReason, Evaluation, FilterDecision, Verdict};
pub use flow::FlowDescriptor;
pub use pipeline::{DecisionReporter, FilterEngine, LogReporter};

/// Initialize the crate-level logger.
///
/// Safe to call repeatedly; only the first call installs the logger.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
