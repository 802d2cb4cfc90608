//! Shared token/response cache with moka
//!
//! Backs the [`KeyValueStore`] port used by both the token namespace and the
//! last known-good response namespace.
//!
//! # Architecture
//!
//! - **Per-entry TTL**: every value carries the TTL it was written with;
//!   moka's [`Expiry`] hook reads it on create and on overwrite
//! - **Bounded**: capacity counts entries, oldest-used entries are evicted
//!   first once full
//! - **Clock**: moka tracks time on its own and cannot be driven by a mock
//!   clock; use `TtlCache` where tests need to age entries

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::sync::Cache;
use moka::Expiry;
use staleguard_core::KeyValueStore;
use staleguard_domain::constants::DEFAULT_CACHE_CAPACITY;
use staleguard_domain::CacheSettings;

/// Moka store configuration
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries across both namespaces
    pub max_capacity: u64,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        Self { max_capacity: DEFAULT_CACHE_CAPACITY }
    }
}

impl From<&CacheSettings> for MokaStoreConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self { max_capacity: settings.max_capacity }
    }
}

impl MokaStoreConfig {
    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(max_capacity = self.max_capacity, "cache store configuration loaded");
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    raw: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was last written with
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory [`KeyValueStore`] with per-entry TTL
///
/// Cloning is cheap and clones share the same entries.
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<String, StoredValue>,
}

impl MokaStore {
    pub fn new(config: MokaStoreConfig) -> Self {
        config.log_config();
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new(MokaStoreConfig::default())
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore").field("entry_count", &self.cache.entry_count()).finish()
    }
}

#[async_trait]
impl KeyValueStore for MokaStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) {
        tracing::trace!(key, ttl_secs = ttl.as_secs(), "cache put");
        self.cache.insert(key.to_string(), StoredValue { raw: value, ttl });
    }

    async fn get(&self, key: &str) -> Option<String> {
        let hit = self.cache.get(key).map(|stored| stored.raw);
        tracing::trace!(key, hit = hit.is_some(), "cache get");
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MokaStore::default();
        store.put("response__orders", r#"{"a":1}"#.to_string(), Duration::from_secs(60)).await;

        assert_eq!(store.get("response__orders").await.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(store.get("response__missing").await, None);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let store = MokaStore::default();
        store.put("short", "1".to_string(), Duration::from_millis(50)).await;
        store.put("long", "2".to_string(), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get("short").await, None);
        assert_eq!(store.get("long").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let store = MokaStore::default();
        store.put("token__svc", "old".to_string(), Duration::from_millis(50)).await;
        store.put("token__svc", "new".to_string(), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get("token__svc").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MokaStore::default();
        let clone = store.clone();
        clone.put("k", "v".to_string(), Duration::from_secs(60)).await;

        assert_eq!(store.get("k").await.as_deref(), Some("v"));
    }
}
