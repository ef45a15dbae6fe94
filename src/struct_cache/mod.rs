//! In-process, partitioned LRU+TTL cache.
//!
//! Ported from `examples/original_source/struct_cache.go`. Values in a
//! [`StructCache<V>`] are generic over `V` rather than `interface{}`, which
//! removes the need for the original's runtime `isPointer` guard (see
//! `struct_cache_helper.go`) entirely: the compiler already guarantees `V`
//! is stored and returned by value.

mod entry;
mod set;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use crate::error::StructCacheError;
use crate::flushable::Flushable;
use crate::key::Key;
use crate::logger::{Logger, NilLogger};
use crate::metric::{since_ms, MetricSink, NullMetricSink};
use set::CacheSet;

/// Default sweep interval applied to every set unless overridden, matching
/// the original's `5 * time.Minute` default ticker.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A partitioned, in-process cache of `V` values keyed by [`Key`], with
/// per-entry TTLs and an LRU eviction policy applied independently within
/// each named partition ("set").
pub struct StructCache<V> {
    sets: RwLock<HashMap<String, Arc<CacheSet<V>>>>,
    default_limit: RwLock<usize>,
    sweep_interval: Duration,
    logger: Arc<dyn Logger>,
    metric: Arc<dyn MetricSink>,
}

impl<V> StructCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache whose sets default to `limit` entries each, using the
    /// default 5-minute sweep interval.
    pub fn new(limit: usize, logger: Arc<dyn Logger>, metric: Arc<dyn MetricSink>) -> Self {
        if logger.is_debug_enabled() {
            logger.debug(&format!("struct_cache: created with {limit} limit of entries"));
        }

        Self {
            sets: RwLock::new(HashMap::new()),
            default_limit: RwLock::new(limit),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            logger,
            metric,
        }
    }

    /// Creates a cache with no logger or metric sink attached.
    pub fn with_defaults(limit: usize) -> Self {
        Self::new(limit, Arc::new(NilLogger), Arc::new(NullMetricSink))
    }

    /// Overrides the sweep interval applied to sets registered from this
    /// point forward. Sets already registered keep running at their
    /// original interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Updates the default per-set entry limit applied to sets registered
    /// from this point forward. Existing sets are unaffected, matching the
    /// original `SetLimit`'s scope.
    pub fn set_limit(&self, limit: usize) {
        let mut current = self.default_limit.write();
        if *current == limit {
            return;
        }

        if self.logger.is_debug_enabled() {
            self.logger
                .debug(&format!("struct_cache: limit has changed, new value: {limit}"));
        }

        *current = limit;
    }

    fn get_set(&self, name: &str) -> Option<Arc<CacheSet<V>>> {
        self.sets.read().get(name).cloned()
    }

    /// Registers a new, empty set named `name` with its own entry limit. If
    /// `start_sweep` is `true`, a background task is spawned to evict
    /// expired entries from the set on `sweep_interval`, requiring a
    /// running Tokio runtime.
    pub fn register_cache_set(
        &self,
        name: &str,
        limit: usize,
        start_sweep: bool,
    ) -> Result<(), StructCacheError> {
        let mut sets = self.sets.write();
        if sets.contains_key(name) {
            return Err(StructCacheError::SetAlreadyExists);
        }

        let set = Arc::new(CacheSet::new(
            name,
            limit,
            Arc::clone(&self.logger),
            Arc::clone(&self.metric),
        ));

        if start_sweep {
            set.start_sweeper(self.sweep_interval);
        }

        sets.insert(name.to_string(), set);
        Ok(())
    }

    /// Inserts or renews `data` under `key` with the given TTL, lazily
    /// registering `key.set` with the default limit (and a running
    /// sweeper) on first use.
    pub fn put(&self, data: V, key: &Key, ttl: Duration) -> Result<(), StructCacheError> {
        if ttl.is_zero() {
            return Err(StructCacheError::InvalidTtl);
        }
        let default_limit = *self.default_limit.read();
        if default_limit == 0 {
            return Err(StructCacheError::InvalidLimit);
        }

        if self.logger.is_debug_enabled() {
            self.logger
                .debug(&format!("struct_cache: PUT {key} with TTL: {ttl:?}"));
        }

        let set = match self.get_set(&key.set) {
            Some(set) => set,
            None => {
                // Ignore SetAlreadyExists: a concurrent put may have won the race.
                let _ = self.register_cache_set(&key.set, default_limit, true);
                self.get_set(&key.set)
                    .ok_or_else(|| StructCacheError::CannotCreateSet(key.set.clone()))?
            }
        };

        set.put(&key.pk, data, ttl);
        Ok(())
    }

    /// Returns the value stored under `key`, along with its creation time,
    /// if present and unexpired.
    pub fn get_with_time(&self, key: &Key) -> (Option<V>, Option<SystemTime>) {
        let started = std::time::Instant::now();

        let found = self.get_set(&key.set).and_then(|set| set.get(&key.pk));

        match &found {
            Some(_) => {
                self.metric.register_hit(&key.set);
                if self.logger.is_debug_enabled() {
                    self.logger.debug(&format!("struct_cache: HIT {key}"));
                }
            }
            None => {
                self.metric.register_miss(&key.set);
                if self.logger.is_debug_enabled() {
                    self.logger.debug(&format!("struct_cache: MISS {key}"));
                }
            }
        }

        self.metric
            .observe_rt(&key.set, "get", false, since_ms(started));

        match found {
            Some((data, created)) => (Some(data), Some(created)),
            None => (None, None),
        }
    }

    /// Returns the value stored under `key`, if present and unexpired.
    pub fn get(&self, key: &Key) -> Option<V> {
        self.get_with_time(key).0
    }

    /// Total number of entries across every set.
    pub fn count(&self) -> usize {
        let count = self.sets.read().values().map(|set| set.len()).sum();

        if self.logger.is_debug_enabled() {
            self.logger.debug(&format!("struct_cache: count() = {count}"));
        }

        count
    }

    /// Searches every set for keys whose lowercased form contains
    /// `masked_key`, stopping once `limit` matches are found.
    pub fn find(&self, masked_key: &str, limit: usize) -> Vec<String> {
        if self.logger.is_debug_enabled() {
            self.logger
                .debug(&format!("struct_cache: FIND {masked_key:?}"));
        }

        let needle = masked_key.to_lowercase();
        let mut remaining = limit;
        let mut result = Vec::with_capacity(limit);

        for set in self.sets.read().values() {
            if remaining == 0 {
                break;
            }
            set.find_matching(&needle, &mut remaining, &mut result);
        }

        result
    }

    /// Removes the entry stored under `key`, if any.
    pub fn remove(&self, key: &Key) {
        if let Some(set) = self.get_set(&key.set) {
            set.remove(&key.pk);
        }
    }

    /// Stops every set's background sweeper without discarding entries.
    pub fn close(&self) {
        for set in self.sets.read().values() {
            set.stop_sweeper();
        }
    }
}

impl<V> Flushable for StructCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn flush(&self) -> usize {
        if self.logger.is_debug_enabled() {
            self.logger.debug("struct_cache: flush()");
        }

        self.sets.read().values().map(|set| set.flush()).sum()
    }
}

impl<V> std::fmt::Debug for StructCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructCache")
            .field("sets", &self.sets.read().len())
            .field("default_limit", &*self.default_limit.read())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}
