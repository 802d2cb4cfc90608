//! `KeyValueStore` over the in-process TTL cache

use std::time::Duration;

use async_trait::async_trait;
use staleguard_common::cache::TtlCache;
use staleguard_common::time::Clock;

use super::ports::KeyValueStore;

#[async_trait]
impl<C> KeyValueStore for TtlCache<String, String, C>
where
    C: Clock + 'static,
{
    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.insert_with_ttl(key.to_string(), value, ttl);
    }

    async fn get(&self, key: &str) -> Option<String> {
        TtlCache::get(self, &key.to_string())
    }
}
