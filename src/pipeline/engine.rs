//! Filter engine.
//!
//! Entry points called from the flow-interception callbacks. Every call
//! answers from in-memory snapshots and returns within the call; `None`
//! means "defer, inspect more of the flow first".

use chrono::Utc;

use crate::buffer::DecisionBuffer;
use crate::config::EngineConfig;
use crate::decision::{decide_flow, decide_user, FilterDecision, FlowPhase, Reporting, UserRules};
use crate::flow::FlowDescriptor;
use crate::keys::FilterKey;
use crate::logging::structured::LogContext;
use crate::log_info;
use crate::sync::{decode_keys, KeySetReport, SyncError, SyncMessage};

use super::reporter::{DecisionReporter, LogReporter};
use super::state::FilterState;

pub struct FilterEngine<R = LogReporter> {
    config: EngineConfig,
    state: FilterState,
    buffer: DecisionBuffer,
    reporter: R,
}

impl Default for FilterEngine<LogReporter> {
    fn default() -> Self {
        Self::new(EngineConfig::default(), LogReporter)
    }
}

impl<R: DecisionReporter> FilterEngine<R> {
    pub fn new(config: EngineConfig, reporter: R) -> Self {
        crate::init_logger();
        let buffer = DecisionBuffer::with_capacity(config.buffer_capacity);
        Self {
            config,
            state: FilterState::new(),
            buffer,
            reporter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// First check, before any flow data is known.
    pub fn evaluate_user_phase(&self, user_id: Option<u32>) -> Option<FilterDecision> {
        let exempt = self.state.exempt_users();
        let suspension = user_id.and_then(|uid| self.state.suspensions().get(uid));
        let decision = decide_user(
            user_id,
            &exempt,
            suspension.as_ref(),
            Utc::now(),
            &self.config,
        )
        .decision()?;
        self.dispatch(&decision);
        Some(decision)
    }

    /// Judge one observation of a flow. Only a new flow may defer.
    pub fn evaluate_flow(&self, flow: &FlowDescriptor, is_completed: bool) -> Option<FilterDecision> {
        let keys = flow
            .user_id
            .map(|uid| self.state.keys(uid))
            .unwrap_or_else(|| Vec::<FilterKey>::new().into());
        let suspension = flow
            .user_id
            .and_then(|uid| self.state.suspensions().get(uid));
        let apps = self.state.apps();

        let rules = UserRules {
            keys: &keys,
            suspension: suspension.as_ref(),
            now: Utc::now(),
        };
        let decision = decide_flow(
            flow,
            FlowPhase::from_completed(is_completed),
            &rules,
            &*apps,
            &self.config,
        )
        .decision()?;
        self.dispatch(&decision);
        Some(decision)
    }

    fn dispatch(&self, decision: &FilterDecision) {
        match decision.reason.reporting() {
            Reporting::Skip => {}
            Reporting::Immediate => self.reporter.report_decision(decision),
            Reporting::Buffered => self.buffer.push(decision.clone()),
        }
    }

    /// Apply one update from the rules-sync channel.
    pub fn apply(&self, message: SyncMessage) -> KeySetReport {
        match message {
            SyncMessage::UserKeys {
                user_id,
                keys,
                manifest,
            } => {
                if let Some(manifest) = manifest {
                    self.state.replace_manifest(&manifest);
                }
                let (keys, report) = decode_keys(keys);
                self.state.replace_keys(user_id, keys);
                log_info!(
                    LogContext::for_user(Some(user_id)),
                    "KEYS_REPLACED",
                    accepted = report.accepted,
                    rejected = report.rejected,
                );
                report
            }
            SyncMessage::AppManifest { manifest } => {
                self.state.replace_manifest(&manifest);
                log::info!("APP_MANIFEST_REPLACED apps={}", manifest.apps.len());
                KeySetReport::default()
            }
            SyncMessage::SetSuspension {
                user_id,
                suspension,
            } => {
                log_info!(
                    LogContext::for_user(Some(user_id)),
                    "SUSPENSION_SET",
                    scope = suspension.scope,
                    expires_at = suspension.expires_at,
                );
                self.state.suspensions().set(user_id, suspension);
                KeySetReport::default()
            }
            SyncMessage::RevokeSuspension { user_id } => {
                let revoked = self.state.suspensions().revoke(user_id);
                log_info!(
                    LogContext::for_user(Some(user_id)),
                    "SUSPENSION_REVOKED",
                    was_active = revoked.is_some(),
                );
                KeySetReport::default()
            }
            SyncMessage::ExemptUsers { user_ids } => {
                log::info!("EXEMPT_USERS_REPLACED users={:?}", user_ids);
                self.state.replace_exempt_users(user_ids);
                KeySetReport::default()
            }
        }
    }

    pub fn apply_json(&self, json: &str) -> Result<KeySetReport, SyncError> {
        Ok(self.apply(SyncMessage::from_json(json)?))
    }

    /// Drain the decision buffer to the reporter. Returns the entry count.
    pub fn flush_decisions(&self) -> usize {
        let entries = self.buffer.flush_recent_first();
        let count = entries.len();
        if count > 0 {
            self.reporter.report_buffered(entries);
        }
        count
    }

    pub fn pending_decisions(&self) -> usize {
        self.buffer.len()
    }
}
