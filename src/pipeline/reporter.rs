//! Reporting channel seam.

use crate::buffer::BufferedDecision;
use crate::decision::FilterDecision;

/// Ships decisions upstream to the controlling app.
///
/// Called on evaluation threads; implementations should hand off and
/// return quickly.
pub trait DecisionReporter: Send + Sync {
    /// A decision that bypasses buffering.
    fn report_decision(&self, decision: &FilterDecision);

    /// Entries drained from the decision buffer, most recent first.
    fn report_buffered(&self, entries: Vec<BufferedDecision>);
}

/// Reporter that writes decisions to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl DecisionReporter for LogReporter {
    fn report_decision(&self, decision: &FilterDecision) {
        log::info!(
            "DECISION_REPORTED verdict={:?} reason={:?} user={:?} app={:?}",
            decision.verdict,
            decision.reason,
            decision.flow.user_id,
            decision.flow.bundle_id
        );
    }

    fn report_buffered(&self, entries: Vec<BufferedDecision>) {
        for entry in &entries {
            log::info!(
                "DECISION_REPORTED verdict={:?} reason={:?} count={} locator={:?}",
                entry.decision.verdict,
                entry.decision.reason,
                entry.count,
                entry.decision.flow.locator()
            );
        }
    }
}
