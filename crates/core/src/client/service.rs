//! Resilient fetch: auth injection, bounded auth retry, cache fallback
//!
//! One logical fetch runs as an explicit loop:
//!
//! ```text
//! Start ──token?──► Requesting ──200 + payload──► Success (cache write)
//!   ▲   └─miss: refresh once, restart      ├──401/403, retries left──► refresh, Start
//!   │                                      └──anything else──────────► SoftFailure
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `SoftFailure` serves the last known-good body for the cache key. Only
//! when nothing is cached does the caller see an error.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use staleguard_common::time::Clock;
use staleguard_domain::constants::{ACCEPT_JSON, DEFAULT_USER_AGENT};
use staleguard_domain::{ClientConfig, ClientError, Credentials, Result, Token};
use tracing::{debug, error, warn};

use super::builder::ResilientApiClientBuilder;
use super::outcome::Fetched;
use crate::auth::{TokenEndpoint, TokenManager};
use crate::cache::{KeyValueStore, ResponseStore, TokenStore};
use crate::http::{GetRequest, HttpResponse, Transport};
use crate::query::{FetchRequest, QueryBuilder};

/// Client for a bearer-protected JSON API that prefers stale data to errors
///
/// Safe to share across tasks. Concurrent fetches may both refresh the
/// token; the last write wins and either token is valid.
pub struct ResilientApiClient {
    tokens: TokenManager,
    transport: Arc<dyn Transport>,
    responses: ResponseStore,
    query: QueryBuilder,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
    max_auth_retries: u32,
    user_agent: String,
}

impl ResilientApiClient {
    pub fn builder() -> ResilientApiClientBuilder {
        ResilientApiClientBuilder::default()
    }

    pub(crate) fn new(
        config: ClientConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let retention = config.retention();
        let tokens = TokenManager::new(
            credentials,
            TokenEndpoint::from_config(&config),
            Arc::clone(&transport),
            TokenStore::new(Arc::clone(&store), retention),
            Arc::clone(&clock),
        );

        Self {
            tokens,
            transport,
            responses: ResponseStore::new(store, retention),
            query: QueryBuilder::new(config.resource_base_url.clone()),
            clock,
            request_timeout: config.request_timeout(),
            max_auth_retries: config.max_auth_retries,
            user_agent: config.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Token manager shared with the fetch path
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Fetch a resource, falling back to the last known-good payload
    ///
    /// # Errors
    ///
    /// [`ClientError::CacheUnavailable`] when the live call failed and
    /// nothing is cached for the request's cache key.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Value> {
        self.fetch_detailed(request).await.map(Fetched::into_payload)
    }

    /// Like [`fetch`](Self::fetch), also reporting where the payload came from
    ///
    /// # Errors
    ///
    /// [`ClientError::CacheUnavailable`] when the live call failed and
    /// nothing is cached for the request's cache key.
    pub async fn fetch_detailed(&self, request: &FetchRequest) -> Result<Fetched> {
        let url = self.query.build_url(request, self.clock.utc_now());
        let cache_key = request.cache_key();
        let mut auth_failures: u32 = 0;
        let mut refreshed_on_miss = false;

        loop {
            let token = match self.tokens.current_token().await {
                Some(token) => token,
                None if !refreshed_on_miss => {
                    refreshed_on_miss = true;
                    self.tokens.refresh().await;
                    continue;
                }
                None => {
                    let reason = ClientError::TokenUnavailable(self.tokens.username().to_string());
                    return self.fall_back(request, reason).await;
                }
            };

            debug!(cache_key, %url, attempt = auth_failures + 1, "requesting resource");
            let response = match self.transport.get(self.resource_request(&url, &token)).await {
                Ok(response) => response,
                Err(err) => return self.fall_back(request, err.into()).await,
            };

            if response.is_auth_failure() {
                auth_failures += 1;
                if auth_failures > self.max_auth_retries {
                    return self.fall_back(request, ClientError::Auth(response.status)).await;
                }
                debug!(
                    cache_key,
                    status = response.status,
                    attempt = auth_failures,
                    "access token rejected, refreshing"
                );
                self.tokens.refresh().await;
                continue;
            }

            return match decode_payload(&response) {
                Ok(payload) => {
                    self.responses.remember(cache_key, &response.body).await;
                    Ok(Fetched::live(request.transform().apply(payload)))
                }
                Err(reason) => self.fall_back(request, reason).await,
            };
        }
    }

    async fn fall_back(&self, request: &FetchRequest, reason: ClientError) -> Result<Fetched> {
        let cache_key = request.cache_key();
        let cached = self
            .responses
            .last_good(cache_key)
            .await
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());

        match cached {
            Some(payload) => {
                warn!(
                    cache_key,
                    reason = reason.label(),
                    error = %reason,
                    "upstream call failed, serving last known-good response"
                );
                Ok(Fetched::cached(request.transform().apply(payload), reason))
            }
            None => {
                error!(
                    cache_key,
                    reason = reason.label(),
                    error = %reason,
                    "upstream call failed and no cached response is available"
                );
                Err(ClientError::CacheUnavailable(cache_key.to_string()))
            }
        }
    }

    fn resource_request(&self, url: &str, token: &Token) -> GetRequest {
        GetRequest {
            url: url.to_string(),
            headers: vec![
                ("Authorization".to_string(), token.bearer()),
                ("Accept".to_string(), ACCEPT_JSON.to_string()),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
            timeout: self.request_timeout,
        }
    }
}

impl std::fmt::Debug for ResilientApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientApiClient")
            .field("tokens", &self.tokens)
            .field("base_url", &self.query.base_url())
            .field("request_timeout", &self.request_timeout)
            .field("max_auth_retries", &self.max_auth_retries)
            .finish_non_exhaustive()
    }
}

/// Decode a non-auth response into a usable payload
fn decode_payload(response: &HttpResponse) -> Result<Value> {
    if !response.is_ok() {
        return Err(ClientError::Upstream(response.status));
    }
    if response.body.trim().is_empty() {
        return Err(ClientError::EmptyPayload);
    }
    let payload: Value =
        serde_json::from_str(&response.body).map_err(|e| ClientError::Decode(e.to_string()))?;
    if is_empty_payload(&payload) {
        return Err(ClientError::EmptyPayload);
    }
    Ok(payload)
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
