//! Shared filter state.
//!
//! Per-user key sets, the exempt-user list and the app index are held as
//! immutable snapshots behind `Arc`. Updates swap in a whole new snapshot,
//! so a reader sees either the old set or the new one, never a mix.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::apps::{AppIdManifest, AppIndex};
use crate::keys::FilterKey;
use crate::suspension::SuspensionTable;

#[derive(Debug, Default)]
pub struct FilterState {
    keys: RwLock<HashMap<u32, Arc<[FilterKey]>>>,
    exempt_users: RwLock<Arc<HashSet<u32>>>,
    apps: RwLock<Arc<AppIndex>>,
    suspensions: SuspensionTable,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current key set for `user_id`; empty when none was ever delivered.
    pub fn keys(&self, user_id: u32) -> Arc<[FilterKey]> {
        self.keys
            .read()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn replace_keys(&self, user_id: u32, keys: Vec<FilterKey>) {
        let snapshot: Arc<[FilterKey]> = Arc::from(keys);
        self.keys.write().insert(user_id, snapshot);
    }

    pub fn remove_keys(&self, user_id: u32) {
        self.keys.write().remove(&user_id);
    }

    pub fn user_ids_with_keys(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.keys.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn exempt_users(&self) -> Arc<HashSet<u32>> {
        Arc::clone(&self.exempt_users.read())
    }

    pub fn replace_exempt_users(&self, user_ids: impl IntoIterator<Item = u32>) {
        let snapshot = Arc::new(user_ids.into_iter().collect::<HashSet<_>>());
        *self.exempt_users.write() = snapshot;
    }

    pub fn apps(&self) -> Arc<AppIndex> {
        Arc::clone(&self.apps.read())
    }

    pub fn replace_manifest(&self, manifest: &AppIdManifest) {
        let index = Arc::new(AppIndex::new(manifest));
        *self.apps.write() = index;
    }

    pub fn suspensions(&self) -> &SuspensionTable {
        &self.suspensions
    }
}
