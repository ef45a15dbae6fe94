//! A single self-refreshing value, with its own background updater task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AutoCacheError;
use crate::logger::Logger;

/// Function type updaters must implement: produce a fresh value, or an
/// error that leaves the previous value (if any) untouched.
pub type Updater<V> = Arc<dyn Fn() -> Result<V, anyhow::Error> + Send + Sync>;

/// Best-effort extraction of a human-readable message from a caught panic
/// payload, for the refresher loop's critical-severity log line.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// One entry of a [`super::AutoCache`]: a value kept fresh by re-running
/// `updater` on a timer.
///
/// Ported from `examples/original_source/auto_cache_entry.go`. Where the
/// original's `Start` could leave `run` stuck `true` after a failed
/// bootstrap call (because the refresher goroutine is only spawned *after*
/// the synchronous bootstrap succeeds), this port resets the running flag
/// on bootstrap failure so a later `start` retries instead of silently
/// never refreshing again.
pub struct AutoCacheEntry<V> {
    name: String,
    value: RwLock<Option<V>>,
    updater: Updater<V>,
    interval: Duration,
    running: AtomicBool,
    quit_tx: RwLock<Option<mpsc::Sender<()>>>,
    task: RwLock<Option<JoinHandle<()>>>,
    logger: Arc<dyn Logger>,
}

impl<V> AutoCacheEntry<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new, not-yet-started entry.
    pub fn new(name: impl Into<String>, updater: Updater<V>, interval: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: name.into(),
            value: RwLock::new(None),
            updater,
            interval,
            running: AtomicBool::new(false),
            quit_tx: RwLock::new(None),
            task: RwLock::new(None),
            logger,
        }
    }

    /// Returns the current value, bootstrapping it synchronously via the
    /// updater if the entry's refresher has not been started yet.
    pub fn get_value(&self) -> Result<V, AutoCacheError> {
        if !self.running.load(Ordering::Acquire) {
            self.process()
                .map_err(AutoCacheError::UpdaterFailed)?;
        }

        self.value
            .read()
            .clone()
            .ok_or(AutoCacheError::ValueNotSet)
    }

    /// Starts the background refresh loop, running the updater once
    /// synchronously first so the entry has a value before returning.
    /// A no-op if already running. If no Tokio runtime is active on the
    /// calling thread, the synchronous bootstrap still runs but the
    /// periodic refresher is skipped — `get_value` keeps working via its
    /// own lazy-bootstrap path, it just re-runs the updater on every call.
    pub fn start(self: &Arc<Self>) -> Result<(), AutoCacheError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Err(err) = self.process() {
            self.running.store(false, Ordering::Release);
            return Err(AutoCacheError::UpdaterFailed(err));
        }

        if tokio::runtime::Handle::try_current().is_err() {
            self.logger.warning(&format!(
                "auto_cache: no Tokio runtime active, entry \"{}\" will not refresh in the background",
                self.name
            ));
            self.running.store(false, Ordering::Release);
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(1);
        *self.quit_tx.write() = Some(tx);

        let entry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(entry.interval);
            ticker.tick().await; // interval fires immediately; consume that first tick
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Panic-isolated: an uncaught panic in the updater must not
                        // take the refresher task down silently.
                        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| entry.process())) {
                            Ok(Ok(())) => {}
                            Ok(Err(err)) => {
                                entry.logger.error(&format!(
                                    "Auto cache updater \"{}\" error: {err}",
                                    entry.name
                                ));
                            }
                            Err(payload) => {
                                entry.logger.critical(&format!(
                                    "Panic in entry.loop(), \"{}\": {}",
                                    entry.name,
                                    panic_message(payload.as_ref())
                                ));
                            }
                        }
                    }
                    _ = rx.recv() => return,
                }
            }
        });

        *self.task.write() = Some(handle);
        Ok(())
    }

    /// Stops the refresh loop and clears the cached value.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        *self.value.write() = None;
        if let Some(tx) = self.quit_tx.write().take() {
            let _ = tx.try_send(());
        }
        self.task.write().take();
    }

    fn process(&self) -> Result<(), anyhow::Error> {
        match (self.updater)() {
            Ok(value) => {
                *self.value.write() = Some(value);
                Ok(())
            }
            Err(err) => {
                self.logger
                    .error(&format!("Auto cache updater \"{}\" error: {err}", self.name));
                Err(err)
            }
        }
    }
}

impl<V> Drop for AutoCacheEntry<V> {
    fn drop(&mut self) {
        if let Some(tx) = self.quit_tx.write().take() {
            let _ = tx.try_send(());
        }
    }
}

impl<V> std::fmt::Debug for AutoCacheEntry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoCacheEntry")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test]
    async fn get_value_bootstraps_lazily() {
        let entry = Arc::new(AutoCacheEntry::new(
            "k",
            Arc::new(|| Ok::<_, anyhow::Error>(42)),
            Duration::from_secs(60),
            Arc::new(crate::logger::NilLogger),
        ));

        assert_eq!(entry.get_value().unwrap(), 42);
    }

    #[tokio::test]
    async fn get_value_propagates_updater_error() {
        let entry = Arc::new(AutoCacheEntry::new(
            "k",
            Arc::new(|| Err::<i32, _>(anyhow::anyhow!("boom"))),
            Duration::from_secs(60),
            Arc::new(crate::logger::NilLogger),
        ));

        assert!(entry.get_value().is_err());
    }

    #[tokio::test]
    async fn start_refreshes_periodically() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let entry = Arc::new(AutoCacheEntry::new(
            "k",
            Arc::new(move || {
                Ok::<_, anyhow::Error>(calls_clone.fetch_add(1, Ordering::SeqCst) as i32)
            }),
            Duration::from_millis(5),
            Arc::new(crate::logger::NilLogger),
        ));

        entry.start().unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        entry.stop();

        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[derive(Default)]
    struct RecordingLogger {
        critical: parking_lot::Mutex<Vec<String>>,
    }

    impl crate::logger::Logger for RecordingLogger {
        fn critical(&self, message: &str) {
            self.critical.lock().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn refresher_panic_is_isolated_and_logged_critical() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let logger = Arc::new(RecordingLogger::default());

        let entry = Arc::new(AutoCacheEntry::new(
            "k",
            Arc::new(move || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                if n == 1 {
                    panic!("boom");
                }
                Ok::<_, anyhow::Error>(n as i32)
            }),
            Duration::from_millis(5),
            logger.clone(),
        ));

        entry.start().unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        entry.stop();

        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(logger.critical.lock().len(), 1);
        assert!(logger.critical.lock()[0].contains("boom"));
    }

    #[tokio::test]
    async fn stop_clears_value() {
        let entry = Arc::new(AutoCacheEntry::new(
            "k",
            Arc::new(|| Ok::<_, anyhow::Error>(1)),
            Duration::from_secs(60),
            Arc::new(crate::logger::NilLogger),
        ));

        entry.start().unwrap();
        entry.stop();

        assert!(matches!(entry.get_value(), Ok(1))); // re-bootstraps since not running
    }
}
