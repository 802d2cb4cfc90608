//! Integration tests for the TTL cache
//!
//! Covers retention-window expiry driven by a mock clock and concurrent
//! access from multiple threads.

#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use staleguard_common::cache::TtlCache;
use staleguard_common::testing::MockClock;

const RETENTION: Duration = Duration::from_secs(72 * 3600);

/// Verifies that entries survive until the retention window elapses and not
/// a moment longer.
///
/// # Test Steps
/// 1. Insert an entry with a 72 hour default TTL
/// 2. Advance the clock to one second before the deadline and read it
/// 3. Advance one more second and confirm it is gone
#[test]
fn test_retention_window_is_a_hard_deadline() {
    let clock = MockClock::new();
    let cache: TtlCache<String, String, MockClock> = TtlCache::with_clock(RETENTION, clock.clone());

    cache.insert("response__orders".to_string(), r#"{"a":1}"#.to_string());

    clock.advance(RETENTION - Duration::from_secs(1));
    assert_eq!(cache.get(&"response__orders".to_string()).as_deref(), Some(r#"{"a":1}"#));

    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.get(&"response__orders".to_string()), None);
}

/// Verifies that concurrent writers and readers on a shared cache never lose
/// writes for distinct keys.
#[test]
fn test_concurrent_access_from_threads() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new(RETENTION));
    let mut handles = vec![];

    for worker in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let key = format!("worker{worker}-{i}");
                cache.insert(key.clone(), i);
                assert_eq!(cache.get(&key), Some(i));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for worker in 0..8 {
        for i in 0..50 {
            assert_eq!(cache.get(&format!("worker{worker}-{i}")), Some(i));
        }
    }
}

/// Verifies that concurrent writers to the same key leave exactly one value,
/// the last one written.
#[test]
fn test_last_write_wins_for_shared_key() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new(RETENTION));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.insert("token__svc".to_string(), worker))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.get(&"token__svc".to_string()).is_some_and(|worker| worker < 4));
}
