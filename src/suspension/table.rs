//! Suspension table.
//!
//! Holds at most one suspension per user. Expiry is computed lazily on
//! read: an expired entry is reported as absent and dropped on the next
//! write to the table.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::keys::AppScope;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSuspension {
    pub scope: AppScope,
    pub expires_at: DateTime<Utc>,
}

impl FilterSuspension {
    pub fn new(scope: AppScope, expires_at: DateTime<Utc>) -> Self {
        Self { scope, expires_at }
    }

    /// Suspension lasting `duration` from now.
    pub fn lasting(scope: AppScope, duration: Duration) -> Self {
        Self::new(scope, Utc::now() + duration)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct SuspensionTable {
    entries: RwLock<HashMap<u32, FilterSuspension>>,
}

impl SuspensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suspension for `user_id`, replacing any existing one.
    pub fn set(&self, user_id: u32, suspension: FilterSuspension) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        entries.retain(|_, s| s.is_active(now));
        entries.insert(user_id, suspension);
    }

    pub fn get(&self, user_id: u32) -> Option<FilterSuspension> {
        self.get_at(user_id, Utc::now())
    }

    /// Active suspension for `user_id` as of `now`.
    pub fn get_at(&self, user_id: u32, now: DateTime<Utc>) -> Option<FilterSuspension> {
        self.entries
            .read()
            .get(&user_id)
            .filter(|s| s.is_active(now))
            .cloned()
    }

    /// Revoke the suspension for `user_id`, returning it if one was active.
    pub fn revoke(&self, user_id: u32) -> Option<FilterSuspension> {
        let now = Utc::now();
        self.entries
            .write()
            .remove(&user_id)
            .filter(|s| s.is_active(now))
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
