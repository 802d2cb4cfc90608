//! Port interface for the cache engine

use std::time::Duration;

use async_trait::async_trait;

/// Process-wide key/value store with per-entry time-to-live
///
/// Implementations must make a value readable immediately after `put`
/// returns, within the same process. Nothing stronger is assumed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: String, ttl: Duration);

    /// Fetch a live value, `None` on miss or expiry
    async fn get(&self, key: &str) -> Option<String>;
}
