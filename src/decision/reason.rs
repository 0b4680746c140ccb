//! Decision types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::FlowDescriptor;
use crate::keys::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Allow,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionReason {
    SystemUser,
    UserIsExempt,
    MissingUserId,
    MissingKeychains,
    DefaultNotAllowed,
    IpAllowed,
    DomainAllowed,
    PathAllowed,
    AppUnrestricted,
    FromGertrudeApp,
    FilterSuspended,
    Dns,
    SystemUiServerInternal,
}

/// How a decision travels upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporting {
    Skip,
    Immediate,
    Buffered,
}

impl DecisionReason {
    /// Reason reported when `key` allows a flow.
    pub fn for_key(key: &Key) -> Self {
        match key {
            Key::Domain { .. } | Key::AnySubdomain { .. } => DecisionReason::DomainAllowed,
            Key::Path { .. } => DecisionReason::PathAllowed,
            Key::IpAddress { .. } => DecisionReason::IpAllowed,
            Key::Skeleton { .. } | Key::DomainRegex { .. } => DecisionReason::AppUnrestricted,
        }
    }

    pub fn reporting(&self) -> Reporting {
        match self {
            DecisionReason::SystemUser
            | DecisionReason::UserIsExempt
            | DecisionReason::FromGertrudeApp => Reporting::Skip,
            DecisionReason::MissingUserId | DecisionReason::FilterSuspended => {
                Reporting::Immediate
            }
            _ => Reporting::Buffered,
        }
    }
}

/// The outcome of one evaluation, with a snapshot of the flow it judged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDecision {
    pub id: Uuid,
    pub verdict: Verdict,
    pub reason: DecisionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_key_id: Option<Uuid>,
    pub flow: FlowDescriptor,
    pub created_at: DateTime<Utc>,
}

impl FilterDecision {
    pub fn new(verdict: Verdict, reason: DecisionReason, flow: &FlowDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            verdict,
            reason,
            responsible_key_id: None,
            flow: flow.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn allow(reason: DecisionReason, flow: &FlowDescriptor) -> Self {
        Self::new(Verdict::Allow, reason, flow)
    }

    pub fn block(reason: DecisionReason, flow: &FlowDescriptor) -> Self {
        Self::new(Verdict::Block, reason, flow)
    }

    pub fn with_key(mut self, key_id: Uuid) -> Self {
        self.responsible_key_id = Some(key_id);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}

/// Result of an evaluation step: a terminal decision, or a request for
/// more flow data before one is possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Decided(FilterDecision),
    Defer,
}

impl Evaluation {
    pub fn decision(self) -> Option<FilterDecision> {
        match self {
            Evaluation::Decided(decision) => Some(decision),
            Evaluation::Defer => None,
        }
    }

    pub fn as_decision(&self) -> Option<&FilterDecision> {
        match self {
            Evaluation::Decided(decision) => Some(decision),
            Evaluation::Defer => None,
        }
    }

    pub fn is_defer(&self) -> bool {
        matches!(self, Evaluation::Defer)
    }
}
