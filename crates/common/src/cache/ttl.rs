//! Thread-safe cache with per-entry time-to-live
//!
//! Entries expire independently: each insert records its own deadline,
//! falling back to the cache-wide default TTL. Expired entries are removed
//! lazily on read.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct TtlEntry<V> {
    value: V,
    /// `None` when the TTL overflowed the clock; such entries never expire
    expires_at: Option<Instant>,
}

impl<V> TtlEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Generic thread-safe cache with per-entry TTL
///
/// Clones share the same storage.
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for expiry checks (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use staleguard_common::cache::TtlCache;
///
/// let cache: TtlCache<String, String> = TtlCache::new(Duration::from_secs(60));
/// cache.insert("key".to_string(), "value".to_string());
/// assert_eq!(cache.get(&"key".to_string()), Some("value".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct TtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    storage: Arc<RwLock<HashMap<K, TtlEntry<V>>>>,
    default_ttl: Duration,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache using the system clock
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a cache with a custom clock (useful for testing)
    pub fn with_clock(default_ttl: Duration, clock: C) -> Self {
        Self { storage: Arc::new(RwLock::new(HashMap::new())), default_ttl, clock }
    }

    /// Insert a value with the default TTL
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert a value that expires `ttl` from now, replacing any previous
    /// entry for the key
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        self.write().insert(key, TtlEntry { value, expires_at: now.checked_add(ttl) });
    }

    /// Get a live value
    ///
    /// Returns `None` if the key doesn't exist or its TTL has elapsed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        {
            let storage = self.read();
            match storage.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it unless a concurrent writer refreshed the key
        let mut storage = self.write();
        if storage.get(key).is_some_and(|entry| entry.is_expired(now)) {
            storage.remove(key);
            trace!("dropped expired cache entry");
        }
        None
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, TtlEntry<V>>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, TtlEntry<V>>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }
}
