//! Integration tests for `StructCache`, mirroring the scenarios in
//! `examples/original_source/struct_cache_test.go`.

use std::time::Duration;

use go_cache_rs::flushable::Flushable;
use go_cache_rs::key::Key;
use go_cache_rs::struct_cache::StructCache;

fn key(set: &str, pk: &str) -> Key {
    Key::new(set, pk)
}

#[tokio::test]
async fn get_returns_put_value() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    let k = key("set1", "1");

    cache.put("data".to_string(), &k, Duration::from_secs(300)).unwrap();

    assert_eq!(cache.get(&k), Some("data".to_string()));
}

#[tokio::test]
async fn renewing_an_existing_key_replaces_data_and_keeps_count_at_one() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    let k = key("set1", "1");

    cache.put("data".to_string(), &k, Duration::from_secs(300)).unwrap();
    cache.put("data2".to_string(), &k, Duration::from_secs(300)).unwrap();

    assert_eq!(cache.get(&k), Some("data2".to_string()));
    assert_eq!(cache.count(), 1);
}

#[tokio::test]
async fn key_missing_from_an_existing_set_is_not_found() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    cache
        .put("data".to_string(), &key("set1", "1"), Duration::from_secs(300))
        .unwrap();

    assert_eq!(cache.get(&key("set1", "2")), None);
}

#[tokio::test]
async fn count_sums_entries_across_all_sets() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    cache.put("data".to_string(), &key("set1", "1"), Duration::from_secs(300)).unwrap();
    cache.put("data".to_string(), &key("set1", "2"), Duration::from_secs(300)).unwrap();
    cache.put("data".to_string(), &key("set2", "1"), Duration::from_secs(300)).unwrap();

    assert_eq!(cache.count(), 3);
}

#[tokio::test]
async fn remove_drops_the_entry() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    let k = key("set1", "1");
    cache.put("data".to_string(), &k, Duration::from_secs(300)).unwrap();

    cache.remove(&k);

    assert_eq!(cache.count(), 0);
}

#[tokio::test]
async fn flush_drops_every_entry_in_every_set() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    cache.put("data".to_string(), &key("set1", "1"), Duration::from_secs(300)).unwrap();
    cache.put("data".to_string(), &key("set2", "1"), Duration::from_secs(300)).unwrap();

    cache.flush();

    assert_eq!(cache.count(), 0);
}

#[tokio::test]
async fn find_matches_keys_by_substring() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    cache.put("data".to_string(), &key("set1", "mask"), Duration::from_secs(300)).unwrap();

    let found = cache.find("as", 1);

    assert_eq!(found, vec!["mask".to_string()]);
}

#[test]
fn register_cache_set_bounds_entries_by_its_own_limit() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    cache.register_cache_set("set1", 1, false).unwrap();

    cache.put("data".to_string(), &key("set1", "1"), Duration::from_secs(300)).unwrap();
    cache.put("data".to_string(), &key("set1", "2"), Duration::from_secs(300)).unwrap();

    assert_eq!(cache.count(), 1);
}

#[test]
fn register_cache_set_twice_reports_already_exists() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);

    cache.register_cache_set("set1", 1, false).unwrap();
    let err = cache.register_cache_set("set1", 1, false).unwrap_err();

    assert!(matches!(err, go_cache_rs::error::StructCacheError::SetAlreadyExists));
}

#[tokio::test]
async fn background_sweeper_evicts_expired_entries() {
    let cache: StructCache<String> =
        StructCache::with_defaults(2).with_sweep_interval(Duration::from_millis(1));
    cache
        .put("data".to_string(), &key("set1", "1"), Duration::from_millis(1))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.count(), 0);
}

#[tokio::test]
async fn close_stops_the_sweeper_so_expired_entries_survive() {
    let cache: StructCache<String> =
        StructCache::with_defaults(2).with_sweep_interval(Duration::from_millis(1));
    cache
        .put("data".to_string(), &key("set1", "1"), Duration::from_millis(5))
        .unwrap();

    cache.close();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.count(), 1);
}

#[tokio::test]
async fn set_limit_bounds_entries_registered_after_the_call() {
    let cache: StructCache<String> = StructCache::with_defaults(1000);
    cache.set_limit(1);

    cache.put("data".to_string(), &key("set1", "1"), Duration::from_secs(300)).unwrap();
    cache.put("data".to_string(), &key("set1", "2"), Duration::from_secs(300)).unwrap();

    assert_eq!(cache.count(), 1);
}

#[test]
fn get_on_a_fresh_cache_is_a_miss() {
    let cache: StructCache<String> = StructCache::with_defaults(1000);
    assert_eq!(cache.get(&key("set1", "1")), None);
}

#[tokio::test]
async fn get_on_an_expired_entry_cleans_it_up() {
    let cache: StructCache<String> = StructCache::with_defaults(1000);
    let k = key("set1", "1");
    cache.put("data".to_string(), &k, Duration::from_millis(1)).unwrap();

    std::thread::sleep(Duration::from_millis(10));

    assert_eq!(cache.get(&k), None);
    assert_eq!(cache.count(), 0);
}
