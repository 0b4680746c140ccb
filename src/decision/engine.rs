//! Decision engine.
//!
//! Pure evaluation over in-memory snapshots. No I/O, no locks: callers
//! pass the current keys, suspension and exemptions for the user.
//!
//! # User-id phase
//! 1. No user id -> Block(missingUserId)
//! 2. System uid -> Allow(systemUser)
//! 3. Exempt uid -> Allow(userIsExempt)
//! 4. Unrestricted suspension -> Allow(filterSuspended)
//! 5. Otherwise defer to the flow phase
//!
//! # Flow phase
//! 1. Controlling app -> Allow(fromGertrudeApp)
//! 2. UI server to a private address -> Allow(systemUiServerInternal)
//! 3. DNS -> Allow(dns)
//! 4. No user id -> Block(missingUserId)
//! 5. Suspension scope matches the app -> Allow(filterSuspended)
//! 6. A key matches -> Allow(reason for key)
//! 7. No keys -> Block(missingKeychains)
//! 8. New flow without hostname or URL -> defer for outbound bytes
//! 9. Otherwise -> Block(defaultNotAllowed)

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::apps::AppIdentityResolver;
use crate::config::EngineConfig;
use crate::flow::{is_private_or_reserved, FlowDescriptor, FlowTarget};
use crate::keys::{AppScope, FilterKey};
use crate::logging::structured::LogContext;
use crate::suspension::FilterSuspension;
use crate::{log_debug, log_warn};

use super::reason::{DecisionReason, Evaluation, FilterDecision};

/// Which observation of a flow is being judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    /// Opened, no payload seen yet.
    New,
    /// Outbound bytes were inspected; absence of a match is final.
    Completed,
}

impl FlowPhase {
    pub fn from_completed(is_completed: bool) -> Self {
        if is_completed {
            FlowPhase::Completed
        } else {
            FlowPhase::New
        }
    }
}

/// Snapshot of one user's rules at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct UserRules<'a> {
    pub keys: &'a [FilterKey],
    pub suspension: Option<&'a FilterSuspension>,
    pub now: DateTime<Utc>,
}

impl<'a> UserRules<'a> {
    fn active_suspension(&self) -> Option<&'a FilterSuspension> {
        self.suspension.filter(|s| s.is_active(self.now))
    }
}

/// Evaluate the user-id phase.
pub fn decide_user(
    user_id: Option<u32>,
    exempt_user_ids: &HashSet<u32>,
    suspension: Option<&FilterSuspension>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Evaluation {
    let ctx = LogContext::for_user(user_id);
    let flow = FlowDescriptor::for_user(user_id);

    let Some(uid) = user_id else {
        log_warn!(ctx, "USER_DECISION", verdict = "block", reason = "missingUserId");
        return Evaluation::Decided(FilterDecision::block(DecisionReason::MissingUserId, &flow));
    };

    if config.is_system_user(uid) {
        return Evaluation::Decided(FilterDecision::allow(DecisionReason::SystemUser, &flow));
    }

    if exempt_user_ids.contains(&uid) {
        log_debug!(ctx, "USER_DECISION", verdict = "allow", reason = "userIsExempt");
        return Evaluation::Decided(FilterDecision::allow(DecisionReason::UserIsExempt, &flow));
    }

    match suspension.filter(|s| s.is_active(now)) {
        Some(s) if s.scope == AppScope::Unrestricted => {
            log_debug!(ctx, "USER_DECISION", verdict = "allow", reason = "filterSuspended");
            Evaluation::Decided(FilterDecision::allow(DecisionReason::FilterSuspended, &flow))
        }
        _ => Evaluation::Defer,
    }
}

/// Evaluate one observation of a flow.
///
/// Only [`FlowPhase::New`] can defer. An IP address is never authorized by
/// an earlier hostname-based allowance: each observation is judged on its
/// own locator.
pub fn decide_flow(
    flow: &FlowDescriptor,
    phase: FlowPhase,
    rules: &UserRules<'_>,
    apps: &dyn AppIdentityResolver,
    config: &EngineConfig,
) -> Evaluation {
    let ctx = LogContext::for_flow(flow);
    let bundle_id = flow.bundle_id.as_deref();

    if bundle_id.is_some_and(|b| config.is_own_app(b)) {
        return Evaluation::Decided(FilterDecision::allow(DecisionReason::FromGertrudeApp, flow));
    }

    if bundle_id.is_some_and(|b| config.is_system_ui_server(b))
        && flow.ip_address.as_deref().is_some_and(is_private_or_reserved)
    {
        return Evaluation::Decided(FilterDecision::allow(
            DecisionReason::SystemUiServerInternal,
            flow,
        ));
    }

    if flow.is_dns_request(config.dns_port) {
        return Evaluation::Decided(FilterDecision::allow(DecisionReason::Dns, flow));
    }

    if flow.user_id.is_none() {
        log_warn!(ctx, "FLOW_DECISION", verdict = "block", reason = "missingUserId");
        return Evaluation::Decided(FilterDecision::block(DecisionReason::MissingUserId, flow));
    }

    if let Some(suspension) = rules.active_suspension() {
        if suspension.scope.matches(bundle_id, apps) {
            log_debug!(ctx, "FLOW_DECISION", verdict = "allow", reason = "filterSuspended");
            return Evaluation::Decided(FilterDecision::allow(
                DecisionReason::FilterSuspended,
                flow,
            ));
        }
    }

    let target = FlowTarget::of(flow);
    if let Some(key) = rules.keys.iter().find(|k| k.matches_target(&target, apps)) {
        let reason = DecisionReason::for_key(&key.key);
        log_debug!(
            ctx,
            "FLOW_DECISION",
            verdict = "allow",
            reason = reason,
            key_id = key.id,
            key_kind = key.key.kind(),
        );
        return Evaluation::Decided(FilterDecision::allow(reason, flow).with_key(key.id));
    }

    if rules.keys.is_empty() {
        log_warn!(ctx, "FLOW_DECISION", verdict = "block", reason = "missingKeychains");
        return Evaluation::Decided(FilterDecision::block(
            DecisionReason::MissingKeychains,
            flow,
        ));
    }

    if phase == FlowPhase::New && !flow.has_locator() {
        log_debug!(ctx, "FLOW_DEFER", ip = flow.ip_address);
        return Evaluation::Defer;
    }

    log_debug!(
        ctx,
        "FLOW_DECISION",
        verdict = "block",
        reason = "defaultNotAllowed",
        locator = flow.locator(),
    );
    Evaluation::Decided(FilterDecision::block(DecisionReason::DefaultNotAllowed, flow))
}
