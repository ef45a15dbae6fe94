//! Auto-refreshing cache: each entry re-computes its value on a timer via a
//! user-supplied updater.
//!
//! Ported from `examples/original_source/auto_cache.go`,
//! `auto_cache_entry.go`, and `auto_cache_fake.go`.

mod entry;
mod fake;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

pub use entry::{AutoCacheEntry, Updater};
pub use fake::AutoCacheFake;

use crate::error::AutoCacheError;
use crate::logger::{Logger, NilLogger};

/// A cache whose entries refresh themselves on a schedule.
pub trait AutoCache<V>: Send + Sync {
    /// Returns the current value for `key`.
    fn get(&self, key: &str) -> Result<V, AutoCacheError>;

    /// Registers (or replaces) the updater for `key`, refreshed every `ttl`.
    fn put(&self, key: &str, ttl: Duration, updater: Updater<V>) -> Result<(), AutoCacheError>;

    /// Stops and removes the entry for `key`, if any.
    fn remove(&self, key: &str);
}

/// The real, timer-backed implementation: each key owns an
/// [`AutoCacheEntry`] whose refresher runs in the background while
/// `active` is `true`.
pub struct StorageAutoCache<V> {
    active: bool,
    entries: RwLock<HashMap<String, Arc<AutoCacheEntry<V>>>>,
    logger: Arc<dyn Logger>,
}

impl<V> StorageAutoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new storage. When `active` is `false`, entries are created
    /// but their refresher is never started — `get` still works via lazy
    /// bootstrap on each call that needs it.
    pub fn new(active: bool, logger: Arc<dyn Logger>) -> Self {
        Self {
            active,
            entries: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Creates an active storage with no logger attached.
    pub fn with_defaults() -> Self {
        Self::new(true, Arc::new(NilLogger))
    }

    fn get_entry(&self, key: &str) -> Result<Arc<AutoCacheEntry<V>>, AutoCacheError> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| AutoCacheError::KeyNotFound(key.to_string()))
    }
}

impl<V> AutoCache<V> for StorageAutoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Result<V, AutoCacheError> {
        self.get_entry(key)?.get_value()
    }

    fn put(&self, key: &str, ttl: Duration, updater: Updater<V>) -> Result<(), AutoCacheError> {
        let entry = Arc::new(AutoCacheEntry::new(key, updater, ttl, Arc::clone(&self.logger)));

        if self.active {
            entry.start()?;
        }

        let mut entries = self.entries.write();
        if let Some(old) = entries.remove(key) {
            old.stop();
        }
        entries.insert(key.to_string(), entry);

        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(entry) = self.get_entry(key) {
            entry.stop();
        }
        self.entries.write().remove(key);
    }
}

impl<V> std::fmt::Debug for StorageAutoCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAutoCache")
            .field("active", &self.active)
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_bootstrapped_value() {
        let cache = StorageAutoCache::with_defaults();
        cache
            .put("k", Duration::from_secs(60), Arc::new(|| Ok::<_, anyhow::Error>(42)))
            .unwrap();

        assert_eq!(cache.get("k").unwrap(), 42);
    }

    #[tokio::test]
    async fn get_missing_key_reports_not_found_with_original_wording() {
        let cache = StorageAutoCache::<i32>::with_defaults();
        let err = cache.get("missing").unwrap_err();
        assert_eq!(err.to_string(), "Auto cache key missing nof found");
    }

    #[tokio::test]
    async fn remove_stops_and_drops_entry() {
        let cache = StorageAutoCache::with_defaults();
        cache
            .put("k", Duration::from_secs(60), Arc::new(|| Ok::<_, anyhow::Error>(1)))
            .unwrap();
        cache.remove("k");

        assert!(cache.get("k").is_err());
    }

    #[tokio::test]
    async fn put_replacing_existing_key_stops_old_entry() {
        let cache = StorageAutoCache::with_defaults();
        cache
            .put("k", Duration::from_secs(60), Arc::new(|| Ok::<_, anyhow::Error>(1)))
            .unwrap();
        cache
            .put("k", Duration::from_secs(60), Arc::new(|| Ok::<_, anyhow::Error>(2)))
            .unwrap();

        assert_eq!(cache.get("k").unwrap(), 2);
    }
}
