//! A single named partition of a [`super::StructCache`].

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use lru::LruCache;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logger::Logger;
use crate::metric::{since_ms, MetricSink};
use crate::struct_cache::entry::Entry;

const SWEEP_BATCH_SIZE: usize = 1000;
const SWEEP_BATCH_PAUSE: Duration = Duration::from_millis(10);

/// One partition of a [`super::StructCache`]: an unbounded [`LruCache`]
/// guarded by a single read-write lock, plus the background sweep task
/// that evicts expired entries.
///
/// Corresponds to `cacheSet` in `examples/original_source/struct_cache.go`.
/// Where the original used separate locking phases to get around the GC
/// owning its linked-list nodes, a single [`parking_lot::RwLock`] around the
/// whole [`LruCache`] is sufficient here because the borrow checker already
/// guarantees no overlapping mutable access.
pub struct CacheSet<V> {
    name: String,
    keys_limit: AtomicUsize,
    entries: RwLock<LruCache<String, Entry<V>>>,
    logger: Arc<dyn Logger>,
    metric: Arc<dyn MetricSink>,
    sweep_handle: RwLock<Option<JoinHandle<()>>>,
    quit_tx: RwLock<Option<mpsc::Sender<()>>>,
}

impl<V> CacheSet<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new, empty set named `name` with the given entry limit.
    pub fn new(
        name: impl Into<String>,
        keys_limit: usize,
        logger: Arc<dyn Logger>,
        metric: Arc<dyn MetricSink>,
    ) -> Self {
        Self {
            name: name.into(),
            keys_limit: AtomicUsize::new(keys_limit),
            entries: RwLock::new(LruCache::unbounded()),
            logger,
            metric,
            sweep_handle: RwLock::new(None),
            quit_tx: RwLock::new(None),
        }
    }

    /// The set's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current maximum number of entries before `put` triggers a trim.
    pub fn keys_limit(&self) -> usize {
        self.keys_limit.load(Ordering::Relaxed)
    }

    /// Number of live entries currently held (valid or not; validity is
    /// only checked lazily on access or sweep, matching the original).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the set currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up `pk`, returning the value and its creation time if present
    /// and unexpired. An expired entry found along the way is evicted as a
    /// side effect, mirroring `cacheSet.getKeyFromSet`.
    pub fn get(&self, pk: &str) -> Option<(V, SystemTime)> {
        let mut guard = self.entries.write();

        let valid = guard.peek(pk).map(Entry::is_valid);
        match valid {
            None => None,
            Some(false) => {
                guard.pop(pk);
                self.metric.set_item_count(&self.name, guard.len() as i64);
                None
            }
            Some(true) => guard
                .get(pk)
                .map(|entry| (entry.data().clone(), entry.create_date())),
        }
    }

    /// Inserts or renews `pk`. Trims the set first if it is already at or
    /// above its limit, mirroring `cacheSet.put`.
    pub fn put(&self, pk: &str, data: V, ttl: Duration) {
        let started = Instant::now();
        let mut guard = self.entries.write();

        if guard.len() >= self.keys_limit() {
            if self.logger.is_debug_enabled() {
                self.logger
                    .debug("struct_cache: ATTENTION! Entities count exceeds limit");
            }
            Self::trim_locked(&mut guard, self.keys_limit(), &self.name, &self.metric);
        }

        if let Some(entry) = guard.get_mut(pk) {
            entry.renew(data, ttl);
            return;
        }

        guard.put(pk.to_string(), Entry::new(data, ttl));
        self.metric.increase_item_count(&self.name);
        self.metric
            .observe_rt(&self.name, "put", false, since_ms(started));
    }

    /// Removes `pk` if present.
    pub fn remove(&self, pk: &str) {
        if self.logger.is_debug_enabled() {
            self.logger.debug(&format!("struct_cache: REMOVE {pk:?}"));
        }

        let mut guard = self.entries.write();
        guard.pop(pk);
        self.metric.set_item_count(&self.name, guard.len() as i64);
    }

    /// Collects every key currently in the set whose lowercased form
    /// contains `needle`, stopping once `limit` matches have been found.
    pub fn find_matching(&self, needle: &str, limit: &mut usize, out: &mut Vec<String>) {
        let guard = self.entries.read();
        for key in guard.iter().map(|(k, _)| k) {
            if *limit == 0 {
                break;
            }
            if key.to_lowercase().contains(needle) {
                out.push(key.clone());
                *limit -= 1;
            }
        }
    }

    /// Removes every entry and returns how many were removed.
    pub fn flush(&self) -> usize {
        let mut guard = self.entries.write();
        let count = guard.len();
        guard.clear();
        self.metric.set_item_count(&self.name, 0);
        count
    }

    /// Evicts least-recently-used entries until the set has fewer than
    /// `keys_limit` entries, leaving room for the entry about to be
    /// inserted. Mirrors `cacheSet.trim`.
    fn trim_locked(
        guard: &mut LruCache<String, Entry<V>>,
        keys_limit: usize,
        name: &str,
        metric: &Arc<dyn MetricSink>,
    ) {
        while guard.len() >= keys_limit && !guard.is_empty() {
            guard.pop_lru();
        }
        metric.set_item_count(name, guard.len() as i64);
    }

    /// Scans the whole set in batches of [`SWEEP_BATCH_SIZE`], evicting any
    /// entry whose TTL has elapsed, and yielding for [`SWEEP_BATCH_PAUSE`]
    /// between batches so a large set doesn't hold the read lock
    /// continuously. Mirrors `cacheSet.collector`'s scan pass.
    async fn sweep_pass(&self) {
        let mut position = 0;

        loop {
            let (expired, reached_end) = {
                let guard = self.entries.read();
                let total = guard.len();
                if position >= total {
                    (Vec::new(), true)
                } else {
                    let mut expired = Vec::new();
                    let mut scanned = 0;
                    for (key, entry) in guard.iter().skip(position).take(SWEEP_BATCH_SIZE) {
                        if !entry.is_valid() {
                            expired.push(key.clone());
                        }
                        scanned += 1;
                    }
                    position += scanned;
                    (expired, position >= total)
                }
            };

            for key in &expired {
                if self.logger.is_debug_enabled() {
                    self.logger
                        .debug(&format!("struct_cache: collector found NOT VALID {key:?}"));
                }
                self.remove(key);
            }

            if reached_end {
                break;
            }

            tokio::time::sleep(SWEEP_BATCH_PAUSE).await;
        }
    }

    /// Starts the background sweep task, ticking every `interval`. A no-op
    /// if a sweep task is already running for this set, or if no Tokio
    /// runtime is active on the calling thread (the set still works, it
    /// just never evicts expired entries except lazily on `get`/`put`).
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let mut handle_guard = self.sweep_handle.write();
        if handle_guard.is_some() {
            return;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            self.logger.warning(&format!(
                "struct_cache: no Tokio runtime active, set {:?} will not sweep in the background",
                self.name
            ));
            return;
        }

        let (tx, mut rx) = mpsc::channel(1);
        *self.quit_tx.write() = Some(tx);

        let set = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        set.sweep_pass().await;
                    }
                    _ = rx.recv() => return,
                }
            }
        });

        *handle_guard = Some(handle);
    }

    /// Signals the sweep task (if any) to stop. Entries are left intact.
    pub fn stop_sweeper(&self) {
        if let Some(tx) = self.quit_tx.write().take() {
            let _ = tx.try_send(());
        }
        self.sweep_handle.write().take();
    }

    /// Updates the entry limit applied on the next `put`.
    pub fn set_keys_limit(&self, limit: usize) {
        self.keys_limit.store(limit, Ordering::Relaxed);
    }
}

impl<V> Drop for CacheSet<V> {
    fn drop(&mut self) {
        self.quit_tx.write().take();
    }
}

impl<V> fmt::Debug for CacheSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSet")
            .field("name", &self.name)
            .field("keys_limit", &self.keys_limit())
            .field("len", &self.len())
            .finish()
    }
}
