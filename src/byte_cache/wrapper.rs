//! Availability-tolerant wrapper: serves from a [`BlackholeByteCache`]
//! until a real backing store finishes connecting, then serves from it.
//!
//! Ported from `examples/original_source/byte_cache_wrapper.go`. The
//! original tracked readiness with a plain `bool` (`isConnected`) written
//! by the connecting goroutine and read by every request with no
//! synchronization between the two — one of the few outright bugs in the
//! source. Here the real cache is published through an
//! [`arc_swap::ArcSwapOption`], so a reader either sees `None` (use the
//! stub) or a fully-constructed `Arc<dyn ByteCache>` with proper
//! acquire/release ordering; there is no window where `isConnected` is true
//! but the pointer it gates isn't visible yet.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{BlackholeByteCache, ByteCache};
use crate::error::ByteCacheError;
use crate::flushable::Flushable;
use crate::key::Key;
use crate::logger::Logger;

/// How long to wait between connection attempts, matching the original's
/// `RetryTimeout`.
pub const RETRY_TIMEOUT: Duration = Duration::from_secs(10);

/// A fallible constructor for the real backing cache, retried until it
/// succeeds.
pub type CacheFactory = Box<dyn Fn() -> Result<Arc<dyn ByteCache>, anyhow::Error> + Send + Sync>;

/// See module docs.
pub struct AvailabilityCacheWrapper {
    real: ArcSwapOption<dyn ByteCache>,
    stub: Arc<BlackholeByteCache>,
    quit_tx: std::sync::Mutex<Option<mpsc::Sender<()>>>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl AvailabilityCacheWrapper {
    /// Creates the wrapper and immediately spawns the background task that
    /// retries `factory` every [`RETRY_TIMEOUT`] until it succeeds. Reads
    /// and writes are served from the blackhole stub until then.
    pub fn new(factory: CacheFactory, logger: Arc<dyn Logger>) -> Arc<Self> {
        let wrapper = Arc::new(Self {
            real: ArcSwapOption::from(None),
            stub: Arc::new(BlackholeByteCache),
            quit_tx: std::sync::Mutex::new(None),
            task: std::sync::Mutex::new(None),
        });

        if tokio::runtime::Handle::try_current().is_err() {
            logger.warning(
                "byte_cache: no Tokio runtime active, availability wrapper will serve the blackhole stub forever",
            );
            return wrapper;
        }

        let (tx, mut rx) = mpsc::channel(1);
        *wrapper.quit_tx.lock().expect("quit_tx mutex poisoned") = Some(tx);

        let target = Arc::clone(&wrapper);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rx.recv() => return,
                    _ = tokio::time::sleep(RETRY_TIMEOUT) => {
                        match factory() {
                            Ok(real) => {
                                target.real.store(Some(real));
                                logger.debug("Wrapped cache was created");
                                return;
                            }
                            Err(err) => {
                                logger.warning(&format!("could not create wrapped cache: {err}"));
                            }
                        }
                    }
                }
            }
        });
        *wrapper.task.lock().expect("task mutex poisoned") = Some(handle);

        wrapper
    }

    fn active(&self) -> Arc<dyn ByteCache> {
        self.real
            .load_full()
            .unwrap_or_else(|| Arc::clone(&self.stub) as Arc<dyn ByteCache>)
    }

    /// Whether the real backing cache has finished connecting.
    pub fn is_connected(&self) -> bool {
        self.real.load().is_some()
    }
}

impl ByteCache for AvailabilityCacheWrapper {
    fn count(&self) -> usize {
        self.active().count()
    }

    fn get(&self, key: &Key) -> Option<Vec<u8>> {
        self.active().get(key)
    }

    fn put(&self, data: &[u8], key: &Key, ttl: Duration) {
        self.active().put(data, key, ttl);
    }

    fn remove(&self, key: &Key) -> Result<(), ByteCacheError> {
        self.active().remove(key)
    }

    fn close(&self) {
        if let Some(tx) = self.quit_tx.lock().expect("quit_tx mutex poisoned").take() {
            let _ = tx.try_send(());
        }
        self.active().close();
    }

    fn clear_set(&self, set: &str) -> Result<(), ByteCacheError> {
        self.active().clear_set(set)
    }

    fn scan_keys(&self, set: &str) -> Result<Vec<Key>, ByteCacheError> {
        self.active().scan_keys(set)
    }
}

impl Flushable for AvailabilityCacheWrapper {
    fn flush(&self) -> usize {
        self.active().flush()
    }
}

impl std::fmt::Debug for AvailabilityCacheWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityCacheWrapper")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_from_blackhole_stub_before_factory_succeeds() {
        let wrapper = AvailabilityCacheWrapper::new(
            Box::new(|| Err(anyhow::anyhow!("not yet"))),
            Arc::new(crate::logger::NilLogger),
        );

        assert!(!wrapper.is_connected());
        assert_eq!(wrapper.get(&Key::new("set", "pk")), None);
        wrapper.close();
    }
}
