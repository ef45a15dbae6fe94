//! Integration tests for `AutoCache`, mirroring
//! `examples/original_source/auto_cache.go` and its example tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use go_cache_rs::auto_cache::{AutoCache, AutoCacheFake, StorageAutoCache};

#[tokio::test]
async fn get_returns_the_bootstrapped_value() {
    let cache = StorageAutoCache::with_defaults();
    cache
        .put("unique-key", Duration::from_secs(100), Arc::new(|| Ok::<_, anyhow::Error>(5)))
        .unwrap();

    assert_eq!(cache.get("unique-key").unwrap(), 5);
}

#[tokio::test]
async fn get_after_remove_reports_the_original_typo_verbatim() {
    let cache = StorageAutoCache::with_defaults();
    cache
        .put("unique-key", Duration::from_secs(100), Arc::new(|| Ok::<_, anyhow::Error>(5)))
        .unwrap();
    cache.remove("unique-key");

    let err = cache.get("unique-key").unwrap_err();

    assert_eq!(err.to_string(), "Auto cache key unique-key nof found");
}

#[tokio::test]
async fn put_replacing_a_key_stops_the_previous_refresher() {
    let refresh_count = Arc::new(AtomicU32::new(0));
    let cache = StorageAutoCache::with_defaults();

    let counter = Arc::clone(&refresh_count);
    cache
        .put(
            "k",
            Duration::from_millis(5),
            Arc::new(move || Ok::<_, anyhow::Error>(counter.fetch_add(1, Ordering::SeqCst))),
        )
        .unwrap();

    cache
        .put("k", Duration::from_secs(100), Arc::new(|| Ok::<_, anyhow::Error>(99)))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.get("k").unwrap(), 99);
}

#[test]
fn fake_auto_cache_runs_the_updater_on_every_get() {
    let cache = AutoCacheFake::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    cache
        .put(
            "k",
            Duration::from_secs(0),
            Arc::new(move || Ok::<_, anyhow::Error>(counter.fetch_add(1, Ordering::SeqCst))),
        )
        .unwrap();

    assert_eq!(cache.get("k").unwrap(), 0);
    assert_eq!(cache.get("k").unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn fake_auto_cache_reports_missing_keys() {
    let cache = AutoCacheFake::<i32>::new();
    assert!(cache.get("missing").is_err());
}
