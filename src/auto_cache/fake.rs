//! A pass-through [`AutoCache`] with no caching or TTL, ported from
//! `examples/original_source/auto_cache_fake.go`.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;

use super::{AutoCache, Updater};
use crate::error::AutoCacheError;

/// Stores raw updaters and calls the matching one on every [`AutoCache::get`].
/// Useful for tests, or when the cost of refreshing on a timer isn't worth
/// paying and callers are fine re-running the updater inline.
#[derive(Default)]
pub struct AutoCacheFake<V> {
    updaters: RwLock<HashMap<String, Updater<V>>>,
}

impl<V> AutoCacheFake<V> {
    /// Creates an empty fake auto cache.
    pub fn new() -> Self {
        Self {
            updaters: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> std::fmt::Debug for AutoCacheFake<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoCacheFake")
            .field("updaters", &self.updaters.read().len())
            .finish()
    }
}

impl<V> AutoCache<V> for AutoCacheFake<V>
where
    V: Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Result<V, AutoCacheError> {
        let updater = self
            .updaters
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| AutoCacheError::KeyNotFound(key.to_string()))?;

        updater().map_err(AutoCacheError::UpdaterFailed)
    }

    fn put(&self, key: &str, _ttl: Duration, updater: Updater<V>) -> Result<(), AutoCacheError> {
        self.updaters.write().insert(key.to_string(), updater);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.updaters.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn get_invokes_updater_on_every_call() {
        let cache = AutoCacheFake::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        cache
            .put(
                "k",
                Duration::from_secs(0),
                Arc::new(move || Ok::<_, anyhow::Error>(calls_clone.fetch_add(1, Ordering::SeqCst))),
            )
            .unwrap();

        assert_eq!(cache.get("k").unwrap(), 0);
        assert_eq!(cache.get("k").unwrap(), 1);
    }

    #[test]
    fn get_missing_key_reports_not_found() {
        let cache = AutoCacheFake::<i32>::new();
        assert!(cache.get("missing").is_err());
    }
}
