//! Integration Tests for the TTL Cache
//!
//! Exercises the public API end to end: expiry, background sweeping,
//! concurrent access, and the close protocol.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time;
use tokio_test::{assert_err, assert_ok};
use ttl_cache::{CacheConfig, CacheError, TtlCache};

const TTL: Duration = Duration::from_secs(5);

// == Expiry ==

#[tokio::test(start_paused = true)]
async fn test_set_get_expire_close_scenario() {
    let cache = TtlCache::new(TTL).unwrap();

    cache.set("my-key", "my-value").unwrap();
    assert_eq!(
        cache.get("my-key").unwrap(),
        Some(Bytes::from_static(b"my-value"))
    );

    time::sleep(Duration::from_secs(6)).await;
    assert_eq!(cache.get("my-key").unwrap(), None);

    assert_ok!(cache.close().await);
    assert_ok!(cache.close().await);
}

#[tokio::test(start_paused = true)]
async fn test_value_survives_until_deadline() {
    let cache = TtlCache::new(TTL).unwrap();
    cache.set("key", vec![0u8, 159, 146, 150]).unwrap();

    time::sleep(Duration::from_millis(4_999)).await;
    assert_eq!(
        cache.get("key").unwrap().as_deref(),
        Some(&[0u8, 159, 146, 150][..])
    );

    time::sleep(Duration::from_millis(1)).await;
    assert_eq!(cache.get("key").unwrap(), None);

    cache.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_extends_lifetime() {
    let cache = TtlCache::new(TTL).unwrap();

    cache.set("key", "first").unwrap();
    time::sleep(Duration::from_secs(4)).await;
    cache.set("key", "second").unwrap();
    time::sleep(Duration::from_secs(4)).await;

    assert_eq!(
        cache.get("key").unwrap(),
        Some(Bytes::from_static(b"second"))
    );
    cache.close().await.unwrap();
}

// == Sweeping ==

#[tokio::test(start_paused = true)]
async fn test_sweeper_reclaims_within_two_ttls() {
    let cache = TtlCache::new(TTL).unwrap();

    // Written just after a tick, the worst case for residency
    time::sleep(Duration::from_millis(100)).await;
    cache.set("key", "value").unwrap();

    time::sleep(TTL).await;
    assert_eq!(cache.len().unwrap(), 1, "Expired entry is resident until the next tick");

    time::sleep(TTL).await;
    assert_eq!(cache.len().unwrap(), 0);

    let stats = cache.stats().unwrap();
    assert_eq!(stats.sweeps, 2);
    assert_eq!(stats.expirations, 1);
    cache.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shorter_sweep_interval_tightens_window() {
    let config = CacheConfig::new(TTL).with_sweep_interval(Duration::from_secs(1));
    let cache = TtlCache::with_config(config).unwrap();

    cache.set("key", "value").unwrap();
    time::sleep(TTL + Duration::from_millis(1_500)).await;

    assert_eq!(cache.len().unwrap(), 0);
    cache.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_keeps_live_entries() {
    let cache = TtlCache::new(TTL).unwrap();

    for i in 0..10 {
        cache.set(format!("key{}", i), "value").unwrap();
        time::sleep(Duration::from_secs(1)).await;
    }

    // Entries written in the last TTL are still resident and readable
    assert!(cache.len().unwrap() >= 4);
    assert!(cache.get("key9").unwrap().is_some());
    cache.close().await.unwrap();
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_disjoint_writers() {
    let cache = Arc::new(TtlCache::new(Duration::from_secs(60)).unwrap());
    let mut handles = Vec::new();

    // 8 blocking workers, each writing and reading back its own keys
    for worker in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::task::spawn_blocking(move || {
            for i in 0..250 {
                let key = format!("worker{}:key{}", worker, i);
                let value = format!("value{}:{}", worker, i);
                cache.set(key.clone(), value.clone()).unwrap();
                assert_eq!(cache.get(&key).unwrap(), Some(Bytes::from(value)));
            }
        }));
    }

    for handle in handles {
        handle.await.expect("worker panicked");
    }

    assert_eq!(cache.len().unwrap(), 2_000);
    for worker in 0..8 {
        for i in 0..250 {
            let value = cache.get(&format!("worker{}:key{}", worker, i)).unwrap();
            assert_eq!(value, Some(Bytes::from(format!("value{}:{}", worker, i))));
        }
    }

    cache.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_from_other_tasks() {
    let cache = Arc::new(TtlCache::new(Duration::from_secs(60)).unwrap());
    cache.set("key", "value").unwrap();

    let closers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.close().await })
        })
        .collect();

    for closer in closers {
        assert_ok!(closer.await.unwrap());
    }
    assert!(cache.is_closed().unwrap());
    assert_eq!(assert_err!(cache.get("key")), CacheError::Closed);
}

// == Close Protocol ==

#[tokio::test(start_paused = true)]
async fn test_use_after_close_is_reported() {
    let cache = TtlCache::new(TTL).unwrap();
    cache.set("key", "value").unwrap();
    cache.close().await.unwrap();

    assert_eq!(assert_err!(cache.set("key", "value")), CacheError::Closed);
    assert_eq!(assert_err!(cache.get("key")), CacheError::Closed);
    assert_eq!(cache.len().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_sweeps_after_close() {
    let cache = TtlCache::new(TTL).unwrap();

    time::sleep(TTL * 2 + Duration::from_secs(1)).await;
    cache.close().await.unwrap();
    let sweeps = cache.stats().unwrap().sweeps;
    assert_eq!(sweeps, 2);

    time::sleep(TTL * 5).await;
    assert_eq!(cache.stats().unwrap().sweeps, sweeps);
}

#[tokio::test(start_paused = true)]
async fn test_close_with_timeout() {
    let config = CacheConfig::new(TTL).with_close_timeout(Duration::from_millis(50));
    let cache = TtlCache::with_config(config).unwrap();

    assert_ok!(cache.close().await);
    assert_ok!(cache.close().await);
}

// == Construction ==

#[tokio::test]
async fn test_invalid_sweep_interval_rejected() {
    let config = CacheConfig::new(TTL).with_sweep_interval(Duration::ZERO);
    let err = TtlCache::with_config(config).unwrap_err();
    assert!(matches!(err, CacheError::InvalidConfig(_)));
}

#[test]
fn test_construction_outside_runtime() {
    let err = TtlCache::new(TTL).unwrap_err();
    assert_eq!(err, CacheError::NoRuntime);
}
