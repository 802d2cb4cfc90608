//! Typed cache namespaces
//!
//! Key layout inside the shared engine:
//!
//! | Key                         | Value                         |
//! |-----------------------------|-------------------------------|
//! | `token__<username>`         | opaque access token           |
//! | `token_expires__<username>` | absolute expiry, unix seconds |
//! | `token_issued__<username>`  | issuance time, unix seconds   |
//! | `response__<cache_key>`     | raw JSON body of last success |
//!
//! The prefixes keep the namespaces disjoint, so a caller-supplied cache key
//! can never shadow a token. Every entry is written with the retention TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use staleguard_domain::constants::{
    RESPONSE_KEY_PREFIX, TOKEN_EXPIRES_KEY_PREFIX, TOKEN_ISSUED_KEY_PREFIX, TOKEN_KEY_PREFIX,
};
use staleguard_domain::Token;
use tracing::{debug, warn};

use super::ports::KeyValueStore;

pub fn token_key(username: &str) -> String {
    format!("{TOKEN_KEY_PREFIX}{username}")
}

pub fn token_expires_key(username: &str) -> String {
    format!("{TOKEN_EXPIRES_KEY_PREFIX}{username}")
}

pub fn token_issued_key(username: &str) -> String {
    format!("{TOKEN_ISSUED_KEY_PREFIX}{username}")
}

pub fn response_key(cache_key: &str) -> String {
    format!("{RESPONSE_KEY_PREFIX}{cache_key}")
}

/// Bearer tokens keyed by username
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    retention: Duration,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Persist a token and its timestamps, overwriting the previous token
    ///
    /// Timestamps are written before the value so a reader never sees a new
    /// token paired with an older token's expiry.
    pub async fn save(&self, username: &str, token: &Token) {
        if let Some(issued_at) = token.issued_at() {
            self.store
                .put(&token_issued_key(username), issued_at.timestamp().to_string(), self.retention)
                .await;
        }
        if let Some(expires_at) = token.expires_at() {
            self.store
                .put(&token_expires_key(username), expires_at.timestamp().to_string(), self.retention)
                .await;
        }
        self.store.put(&token_key(username), token.value().to_string(), self.retention).await;
    }

    /// Load the cached token for `username`
    ///
    /// A missing or unreadable timestamp leaves that field unknown; only a
    /// missing value is a miss.
    pub async fn load(&self, username: &str) -> Option<Token> {
        let value = self.store.get(&token_key(username)).await?;
        let issued_at = self.timestamp(&token_issued_key(username)).await;
        let expires_at = self.timestamp(&token_expires_key(username)).await;
        Some(Token::new(value, issued_at, expires_at))
    }

    async fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.store.get(key).await?;
        let parsed = raw.trim().parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0));
        if parsed.is_none() {
            warn!(key, "ignoring unreadable token timestamp");
        }
        parsed
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("retention", &self.retention).finish_non_exhaustive()
    }
}

/// Last known-good raw response bodies keyed by caller cache key
#[derive(Clone)]
pub struct ResponseStore {
    store: Arc<dyn KeyValueStore>,
    retention: Duration,
}

impl ResponseStore {
    pub fn new(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Record the raw body of a successful response
    ///
    /// Callers must only pass bodies that decoded to a non-empty payload.
    pub async fn remember(&self, cache_key: &str, raw_body: &str) {
        self.store.put(&response_key(cache_key), raw_body.to_string(), self.retention).await;
        debug!(cache_key, bytes = raw_body.len(), "cached response body");
    }

    /// Raw body of the most recent success, if still retained
    pub async fn last_good(&self, cache_key: &str) -> Option<String> {
        self.store.get(&response_key(cache_key)).await
    }
}

impl std::fmt::Debug for ResponseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStore").field("retention", &self.retention).finish_non_exhaustive()
    }
}
