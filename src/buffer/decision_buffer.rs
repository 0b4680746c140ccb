//! Bounded, merging decision buffer.
//!
//! Two decisions merge when verdict, reason, responsible key, requesting
//! app and matched locator are equal. The locator is the URL, else the
//! hostname, else the IP address, so the same resource reached through
//! different addresses collapses into one entry.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::config::DECISION_BUFFER_CAPACITY;
use crate::decision::{DecisionReason, FilterDecision, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    verdict: Verdict,
    reason: DecisionReason,
    responsible_key_id: Option<Uuid>,
    bundle_id: Option<String>,
    locator: Option<String>,
}

impl MergeKey {
    pub fn of(decision: &FilterDecision) -> Self {
        Self {
            verdict: decision.verdict,
            reason: decision.reason,
            responsible_key_id: decision.responsible_key_id,
            bundle_id: decision.flow.bundle_id.clone(),
            locator: decision.flow.locator().map(str::to_string),
        }
    }
}

/// A decision with the number of times it was pushed since the last flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferedDecision {
    pub decision: FilterDecision,
    pub count: u32,
}

#[derive(Debug)]
struct Slot {
    entry: BufferedDecision,
    last_push: u64,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<MergeKey, Slot>,
    sequence: u64,
}

#[derive(Debug)]
pub struct DecisionBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl Default for DecisionBuffer {
    fn default() -> Self {
        Self::with_capacity(DECISION_BUFFER_CAPACITY)
    }
}

impl DecisionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding at most `capacity` distinct entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, decision: FilterDecision) {
        let key = MergeKey::of(&decision);
        let mut inner = self.inner.lock();
        inner.sequence += 1;
        let sequence = inner.sequence;

        if let Some(slot) = inner.slots.get_mut(&key) {
            slot.entry.count = slot.entry.count.saturating_add(1);
            slot.last_push = sequence;
            return;
        }

        if inner.slots.len() >= self.capacity {
            evict_oldest(&mut inner.slots);
        }
        inner.slots.insert(
            key,
            Slot {
                entry: BufferedDecision { decision, count: 1 },
                last_push: sequence,
            },
        );
    }

    /// Drain every entry, most recently pushed first.
    ///
    /// The lock is held only to swap the map out; ordering happens after.
    pub fn flush_recent_first(&self) -> Vec<BufferedDecision> {
        let slots = std::mem::take(&mut self.inner.lock().slots);
        let mut slots: Vec<Slot> = slots.into_values().collect();
        slots.sort_unstable_by(|a, b| b.last_push.cmp(&a.last_push));
        slots.into_iter().map(|s| s.entry).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().slots.is_empty()
    }
}

fn evict_oldest(slots: &mut HashMap<MergeKey, Slot>) {
    let oldest = slots
        .iter()
        .min_by_key(|(_, slot)| slot.last_push)
        .map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        if let Some(slot) = slots.remove(&key) {
            log::warn!(
                "DECISION_BUFFER_EVICTED reason={:?} count={} locator={:?}",
                slot.entry.decision.reason,
                slot.entry.count,
                key.locator
            );
        }
    }
}
