//! Process identity to OS user id resolution.
//!
//! Resolving a process token is comparatively expensive, so lookups are
//! memoised per token. The cache is bounded, and tokens that did not
//! resolve are only remembered for a short while.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::config::{USER_ID_CACHE_CAPACITY, USER_ID_NEGATIVE_TTL_SECS};

/// Resolves an opaque process-identity token to the owning user id.
pub trait ProcessIdentityResolver: Send + Sync {
    fn uid_for_process_token(&self, token: &[u8]) -> Option<u32>;
}

impl<F> ProcessIdentityResolver for F
where
    F: Fn(&[u8]) -> Option<u32> + Send + Sync,
{
    fn uid_for_process_token(&self, token: &[u8]) -> Option<u32> {
        self(token)
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedUid {
    uid: Option<u32>,
    /// Set for failed lookups only.
    expires_at: Option<Instant>,
}

impl CachedUid {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Bounded, memoising wrapper around a [`ProcessIdentityResolver`].
pub struct UserIdCache<R> {
    resolver: R,
    cache: RwLock<HashMap<Vec<u8>, CachedUid>>,
    max_entries: usize,
    negative_ttl: Duration,
}

impl<R: ProcessIdentityResolver> UserIdCache<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_limits(
            resolver,
            USER_ID_CACHE_CAPACITY,
            Duration::from_secs(USER_ID_NEGATIVE_TTL_SECS),
        )
    }

    pub fn with_limits(resolver: R, max_entries: usize, negative_ttl: Duration) -> Self {
        Self {
            resolver,
            cache: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            negative_ttl,
        }
    }

    pub fn user_id(&self, token: &[u8]) -> Option<u32> {
        self.user_id_at(token, Instant::now())
    }

    pub fn user_id_at(&self, token: &[u8], now: Instant) -> Option<u32> {
        if let Some(cached) = self.cache.read().get(token).filter(|c| c.is_fresh(now)) {
            return cached.uid;
        }

        let uid = self.resolver.uid_for_process_token(token);
        let expires_at = match uid {
            Some(_) => None,
            None => {
                log::warn!("PROCESS_UID_UNRESOLVED token_len={}", token.len());
                Some(now + self.negative_ttl)
            }
        };

        let mut cache = self.cache.write();
        if !cache.contains_key(token) && cache.len() >= self.max_entries {
            self.make_room(&mut cache, now);
        }
        cache.insert(token.to_vec(), CachedUid { uid, expires_at });
        uid
    }

    /// Drop stale failures first; if still full, drop a quarter of the rest.
    fn make_room(&self, cache: &mut HashMap<Vec<u8>, CachedUid>, now: Instant) {
        cache.retain(|_, cached| cached.is_fresh(now));
        if cache.len() < self.max_entries {
            return;
        }

        let evict = (cache.len() / 4).max(1);
        let victims: Vec<Vec<u8>> = cache.keys().take(evict).cloned().collect();
        for token in &victims {
            cache.remove(token);
        }
        log::info!("USER_ID_CACHE_TRIMMED evicted={} remaining={}", evict, cache.len());
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}
