//! End-to-end behaviour of the resilient fetch path
//!
//! Runs the real client against a scripted transport and a clock-driven TTL
//! cache so refresh counts, cache contents and expiry are exact.

#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use staleguard_common::cache::TtlCache;
use staleguard_common::testing::{utc, MockClock};
use staleguard_core::testing::ScriptedTransport;
use staleguard_core::{
    FetchRequest, HttpResponse, PayloadSource, ResilientApiClient, TokenStore, Transform,
};
use staleguard_domain::{ClientConfig, ClientError, Credentials, Token, TransportError};

const RETENTION: Duration = Duration::from_secs(72 * 3600);
const MAX_RETRIES: usize = 5;

struct Harness {
    client: ResilientApiClient,
    transport: Arc<ScriptedTransport>,
    engine: Arc<TtlCache<String, String, MockClock>>,
    clock: MockClock,
}

impl Harness {
    fn new() -> Self {
        let clock = MockClock::at(utc(2024, 4, 2, 9, 15, 0));
        let engine: Arc<TtlCache<String, String, MockClock>> =
            Arc::new(TtlCache::with_clock(RETENTION, clock.clone()));
        let transport = Arc::new(ScriptedTransport::new());
        let client = ResilientApiClient::builder()
            .config(ClientConfig::new("https://auth.example.com/token", "https://api.example.com/v1"))
            .credentials(Credentials::new("svc", "pw"))
            .transport(transport.clone())
            .store(engine.clone())
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap();
        Self { client, transport, engine, clock }
    }

    async fn seed_token(&self) {
        TokenStore::new(self.engine.clone(), RETENTION)
            .save("svc", &Token::new("seeded", None, None))
            .await;
    }

    fn seed_response(&self, cache_key: &str, body: &str) {
        self.engine.insert(format!("response__{cache_key}"), body.to_string());
    }

    fn cached(&self, cache_key: &str) -> Option<String> {
        self.engine.get(&format!("response__{cache_key}"))
    }
}

/// Cache empty, upstream answers 200 with a payload: the payload is returned
/// and its raw body cached under the caller's key.
#[tokio::test]
async fn test_live_success_is_returned_and_cached() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(200, r#"{"a":1}"#);

    let fetched = h.client.fetch_detailed(&FetchRequest::new("items").with_cache_key("K")).await;

    assert_eq!(fetched.unwrap().payload, json!({"a": 1}));
    assert_eq!(h.cached("K").as_deref(), Some(r#"{"a":1}"#));
}

/// Cached payload plus a timing-out upstream: the cached payload is served
/// without error.
#[tokio::test]
async fn test_timeout_serves_cached_payload() {
    let h = Harness::new();
    h.seed_token().await;
    h.seed_response("K", r#"{"a":1}"#);
    h.transport.push_failure(TransportError::Timeout(5_000));

    let fetched =
        h.client.fetch_detailed(&FetchRequest::new("items").with_cache_key("K")).await.unwrap();

    assert_eq!(fetched.payload, json!({"a": 1}));
    assert_eq!(
        fetched.source,
        PayloadSource::Cache { reason: ClientError::Transport(TransportError::Timeout(5_000)) }
    );
}

/// Three 401s then a success: exactly three refreshes and the final payload.
#[tokio::test]
async fn test_auth_failures_refresh_then_succeed() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(401, "").push_response(401, "").push_response(401, "");
    h.transport.push_response(200, r#"{"b":2}"#);

    let payload = h.client.fetch(&FetchRequest::new("items")).await.unwrap();

    assert_eq!(payload, json!({"b": 2}));
    assert_eq!(h.transport.refresh_count(), 3);
    assert_eq!(
        h.transport.authorizations(),
        vec![
            Some("Bearer seeded".to_string()),
            Some("Bearer token-1".to_string()),
            Some("Bearer token-2".to_string()),
            Some("Bearer token-3".to_string()),
        ]
    );
}

/// 200 with an empty body and nothing cached: unavailable, cache untouched.
#[tokio::test]
async fn test_empty_payload_without_cache_is_unavailable() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(200, "");

    let result = h.client.fetch(&FetchRequest::new("items").with_cache_key("K")).await;

    assert_eq!(result, Err(ClientError::CacheUnavailable("K".to_string())));
    assert_eq!(h.cached("K"), None);
    assert_eq!(h.transport.refresh_count(), 0);
}

/// 500 with stale data cached: stale data, no retry.
#[tokio::test]
async fn test_server_error_serves_stale_data_without_retry() {
    let h = Harness::new();
    h.seed_token().await;
    h.seed_response("K", r#"{"stale":true}"#);
    h.transport.push_response(500, "boom");

    let fetched =
        h.client.fetch_detailed(&FetchRequest::new("items").with_cache_key("K")).await.unwrap();

    assert_eq!(fetched.payload, json!({"stale": true}));
    assert_eq!(fetched.fallback_reason(), Some(&ClientError::Upstream(500)));
    assert_eq!(h.transport.get_count(), 1);
    assert_eq!(h.transport.refresh_count(), 0);
}

/// Endless 401s terminate with the fallback after a bounded number of
/// refreshes.
#[tokio::test]
async fn test_auth_retries_are_bounded() {
    let h = Harness::new();
    h.seed_response("K", r#"{"a":1}"#);
    h.transport.set_fallback_response(401, "");

    let fetched =
        h.client.fetch_detailed(&FetchRequest::new("items").with_cache_key("K")).await.unwrap();

    assert_eq!(fetched.payload, json!({"a": 1}));
    assert_eq!(fetched.fallback_reason(), Some(&ClientError::Auth(401)));
    // One refresh for the initial cache miss plus one per tolerated rejection
    assert_eq!(h.transport.refresh_count(), MAX_RETRIES + 1);
    assert_eq!(h.transport.get_count(), MAX_RETRIES + 1);
}

#[tokio::test]
async fn test_forbidden_counts_as_auth_failure() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.set_fallback_response(403, "");

    let result = h.client.fetch(&FetchRequest::new("items")).await;

    assert_eq!(result, Err(ClientError::CacheUnavailable("items".to_string())));
    assert_eq!(h.transport.refresh_count(), MAX_RETRIES);
}

/// No cached token: one refresh, then the original request with the new
/// token.
#[tokio::test]
async fn test_missing_token_refreshes_exactly_once() {
    let h = Harness::new();
    h.transport.push_response(200, "[1,2,3]");

    let payload = h.client.fetch(&FetchRequest::new("items")).await.unwrap();

    assert_eq!(payload, json!([1, 2, 3]));
    assert_eq!(h.transport.refresh_count(), 1);
    assert_eq!(h.transport.authorizations(), vec![Some("Bearer token-1".to_string())]);
}

#[tokio::test]
async fn test_failed_refresh_on_miss_falls_back_without_request() {
    let h = Harness::new();
    h.seed_response("items", r#"{"a":1}"#);
    h.transport.push_token_response(HttpResponse::new(401, r#"{"error":"invalid_grant"}"#));

    let fetched = h.client.fetch_detailed(&FetchRequest::new("items")).await.unwrap();

    assert_eq!(fetched.payload, json!({"a": 1}));
    assert_eq!(fetched.fallback_reason(), Some(&ClientError::TokenUnavailable("svc".to_string())));
    assert_eq!(h.transport.refresh_count(), 1);
    assert_eq!(h.transport.get_count(), 0);
}

/// An empty 200 never overwrites a good cached body.
#[tokio::test]
async fn test_empty_payload_does_not_poison_cache() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(200, r#"{"a":1}"#);
    h.transport.push_response(200, "{}");
    h.transport.push_response(200, "null");
    let request = FetchRequest::new("items").with_cache_key("K");

    h.client.fetch(&request).await.unwrap();
    let second = h.client.fetch_detailed(&request).await.unwrap();
    let third = h.client.fetch_detailed(&request).await.unwrap();

    assert_eq!(second.payload, json!({"a": 1}));
    assert_eq!(second.fallback_reason(), Some(&ClientError::EmptyPayload));
    assert_eq!(third.payload, json!({"a": 1}));
    assert_eq!(h.cached("K").as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(h.transport.refresh_count(), 0);
}

/// Repeated calls against a dead upstream keep returning the same payload
/// until the retention window passes.
#[tokio::test]
async fn test_fallback_is_idempotent_until_retention_expires() {
    let h = Harness::new();
    h.seed_token().await;
    h.seed_response("K", r#"{"a":1}"#);
    h.transport.set_fallback_failure(TransportError::Connect("refused".to_string()));
    let request = FetchRequest::new("items").with_cache_key("K");

    for _ in 0..3 {
        assert_eq!(h.client.fetch(&request).await, Ok(json!({"a": 1})));
    }

    h.clock.advance(RETENTION);
    assert_eq!(h.client.fetch(&request).await, Err(ClientError::CacheUnavailable("K".to_string())));
}

/// The transform sees the same payload whether it came live or from cache.
#[tokio::test]
async fn test_transform_applies_to_live_and_cached_payloads() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(200, r#"{"data":[{"id":1},{"id":2}]}"#);
    h.transport.push_failure(TransportError::Timeout(5_000));
    let ids = Transform::new(|payload: Value| {
        payload["data"].as_array().map_or(Value::Null, |rows| {
            rows.iter().map(|row| row["id"].clone()).collect::<Vec<_>>().into()
        })
    });
    let request = FetchRequest::new("items").with_transform(ids);

    let live = h.client.fetch_detailed(&request).await.unwrap();
    let cached = h.client.fetch_detailed(&request).await.unwrap();

    assert!(!live.is_stale());
    assert!(cached.is_stale());
    assert_eq!(live.payload, json!([1, 2]));
    assert_eq!(cached.payload, live.payload);
    // The raw body is cached, not the transformed one
    assert_eq!(h.cached("items").as_deref(), Some(r#"{"data":[{"id":1},{"id":2}]}"#));
}

#[tokio::test]
async fn test_request_carries_window_and_headers() {
    let h = Harness::new();
    h.seed_token().await;
    h.transport.push_response(200, "[1]");
    let request = FetchRequest::new("/reports").with_interval("today").unwrap();

    h.client.fetch(&request).await.unwrap();

    let sent = h.transport.get_requests().remove(0);
    assert_eq!(
        sent.url,
        "https://api.example.com/v1/reports?start=2024-04-02T00%3A00%3A00&end=2024-04-02T09%3A15%3A00"
    );
    assert_eq!(sent.timeout, Duration::from_secs(5));
    assert!(sent.headers.contains(&("Accept".to_string(), "application/json".to_string())));
}

#[tokio::test]
async fn test_concurrent_fetches_tolerate_duplicate_refresh() {
    let h = Harness::new();
    h.transport.set_fallback_response(200, r#"{"ok":true}"#);
    let request = FetchRequest::new("items");

    let (first, second) = tokio::join!(h.client.fetch(&request), h.client.fetch(&request));

    assert_eq!(first, Ok(json!({"ok": true})));
    assert_eq!(second, Ok(json!({"ok": true})));
    assert!((1..=2).contains(&h.transport.refresh_count()));
}

#[test]
fn test_builder_requires_transport_and_store() {
    let err = ResilientApiClient::builder()
        .config(ClientConfig::new("https://auth.example.com/token", "https://api.example.com"))
        .credentials(Credentials::new("svc", "pw"))
        .build()
        .unwrap_err();

    assert_eq!(err, ClientError::Config("transport not set".to_string()));
}
