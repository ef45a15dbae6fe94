//! Aerospike-backed [`ByteCache`].
//!
//! Ported from `examples/original_source/byte_cache_aerospike.go`. The
//! `aerospike` crate mirrors the Go client's synchronous, blocking call
//! style closely enough that this port keeps the same structure: one
//! `Client`, one read [`aerospike::ReadPolicy`], and a background task that
//! periodically republishes the per-node connection count metric.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aerospike::{
    as_bin, Bin, Bins, Client, ClientPolicy, CollectionIndexType, Filter, Host, IndexType,
    Priority, QueryPolicy, ReadPolicy, RecordExistsAction, ScanPolicy, Statement, WritePolicy,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::{AerospikeConfig, AerospikeIndex};
use super::ByteCache;
use crate::error::ByteCacheError;
use crate::flushable::Flushable;
use crate::key::Key;
use crate::logger::Logger;
use crate::metric::{since_ms, MetricSink};

const DATA_BIN: &str = "data";
const TAGS_BIN: &str = "tags";

/// Best-effort extraction of a human-readable message from a caught panic
/// payload, for [`ByteCacheError::TagRemovePanic`].
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Parses `config.hosts` (each `"host:port"`) and builds the
/// [`ClientPolicy`] used to connect, mirroring `CreateAerospikeClient`.
pub fn build_client_policy(config: &AerospikeConfig) -> Result<(ClientPolicy, Vec<Host>), ByteCacheError> {
    if config.namespace.is_empty() {
        return Err(ByteCacheError::EmptyNamespace);
    }

    if config.hosts.is_empty() || (config.hosts.len() == 1 && config.hosts[0].is_empty()) {
        return Err(ByteCacheError::EmptyHosts);
    }

    let mut hosts = Vec::with_capacity(config.hosts.len());
    for addr in &config.hosts {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| ByteCacheError::InvalidHostAddress(addr.clone()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| ByteCacheError::InvalidHostAddress(addr.clone()))?;
        hosts.push(Host::new(host, port));
    }

    let mut policy = ClientPolicy::default();
    if !config.connection_timeout.is_zero() {
        policy.timeout = Some(config.connection_timeout);
    }
    if !config.idle_timeout.is_zero() {
        policy.idle_timeout = Some(config.idle_timeout);
    }
    if config.connection_queue_size > 0 {
        policy.connection_pool_size_per_node = config.connection_queue_size;
    }
    policy.fail_if_not_connected = config.fail_if_not_connected;

    Ok((policy, hosts))
}

/// Connects a new [`Client`] using `config`. Mirrors `CreateAerospikeClient`.
pub fn create_client(config: &AerospikeConfig) -> Result<Client, ByteCacheError> {
    let (policy, hosts) = build_client_policy(config)?;
    Client::new(&policy, &hosts).map_err(|err| ByteCacheError::Remote(err.into()))
}

/// Aerospike-backed implementation of [`ByteCache`].
pub struct AerospikeByteCache {
    namespace: String,
    client: Client,
    cache_prefix: Mutex<String>,
    read_policy: ReadPolicy,
    max_retries: usize,
    remove_timeout: Duration,
    put_timeout: Duration,
    logger: Arc<dyn Logger>,
    metric: Arc<dyn MetricSink>,
    connection_count_metric_interval: Duration,
    quit_tx: Mutex<Option<mpsc::Sender<()>>>,
    connection_count_task: Mutex<Option<JoinHandle<()>>>,
}

impl AerospikeByteCache {
    /// Wraps an already-connected `client`, spawning the background
    /// connection-count metric task. Mirrors `newAerospike`.
    pub fn new(
        config: &AerospikeConfig,
        client: Client,
        logger: Arc<dyn Logger>,
        metric: Arc<dyn MetricSink>,
    ) -> Arc<Self> {
        let mut read_policy = ReadPolicy::default();
        read_policy.timeout = Some(if config.read_timeout.is_zero() {
            Duration::from_millis(100)
        } else {
            config.read_timeout
        });
        read_policy.max_retries = Some(config.max_retries);
        read_policy.sleep_between_retries = Some(config.sleep_between_retries);

        let update_interval = if config.update_connection_count_metric_interval.is_zero() {
            Duration::from_secs(1)
        } else {
            config.update_connection_count_metric_interval
        };

        let cache = Arc::new(Self {
            namespace: config.namespace.clone(),
            client,
            cache_prefix: Mutex::new(config.prefix.clone()),
            read_policy,
            max_retries: config.max_retries,
            remove_timeout: config.remove_timeout,
            put_timeout: config.put_timeout,
            logger,
            metric,
            connection_count_metric_interval: update_interval,
            quit_tx: Mutex::new(None),
            connection_count_task: Mutex::new(None),
        });

        cache.start_connection_count_metric();
        cache
    }

    /// Creates (or confirms the existence of) a `ContainsFilter`-queryable
    /// index over the `tags` bin for `index.set_name`. Treats `IndexFound`
    /// as success, matching `CreateTagsIndex`.
    pub fn create_tags_index(&self, index: &AerospikeIndex) -> Result<(), ByteCacheError> {
        if index.set_name.is_empty() || index.index_name.is_empty() {
            return Err(ByteCacheError::Remote(anyhow::anyhow!(
                "set_name and index_name must not be empty"
            )));
        }

        let mut policy = WritePolicy::default();
        policy.base_policy.max_retries = Some(self.max_retries);

        match self.client.create_complex_index(
            &policy,
            &self.namespace,
            &index.set_name,
            &index.index_name,
            TAGS_BIN,
            IndexType::String,
            CollectionIndexType::List,
        ) {
            Ok(task) => task
                .wait_till_complete(None)
                .map_err(|err| ByteCacheError::Remote(err.into())),
            Err(err) if err.to_string().contains("INDEX_FOUND") => {
                self.logger.debug(&format!(
                    "Index {} already exists. Namespace: {}, setName: {}",
                    index.index_name, self.namespace, index.set_name
                ));
                Ok(())
            }
            Err(err) => Err(ByteCacheError::Remote(err.into())),
        }
    }

    /// Overrides the prefix prepended to every pk/tag. Mirrors
    /// `SetCachePrefix`.
    pub fn set_cache_prefix(&self, prefix: impl Into<String>) {
        *self.cache_prefix.lock() = prefix.into();
    }

    fn create_key(&self, set: &str, pk: &str) -> Result<aerospike::Key, ByteCacheError> {
        let prefixed = format!("{}{}", self.cache_prefix.lock(), pk);
        aerospike::Key::new(&self.namespace, set, prefixed)
            .map_err(|err| ByteCacheError::Remote(err.into()))
    }

    fn write_policy(&self, ttl: Duration) -> WritePolicy {
        let mut policy = WritePolicy::default();
        policy.base_policy.max_retries = Some(self.max_retries);
        policy.record_exists_action = RecordExistsAction::Replace;
        policy.expiration = aerospike::Expiration::Seconds(ttl.as_secs() as u32);
        policy
    }

    fn put_by_pk(&self, data: &[u8], set: &str, pk: &str, ttl: Duration) -> Result<(), ByteCacheError> {
        let aero_key = self.create_key(set, pk)?;
        let bin = as_bin!(DATA_BIN, data.to_vec());
        let policy = self.write_policy(ttl);

        self.client
            .put(&policy, &aero_key, &[bin])
            .map_err(|err| {
                self.logger.warning(&format!(
                    "could not put into set '{set}' by primary key '{pk}': {err}"
                ));
                ByteCacheError::Remote(err.into())
            })
    }

    /// Mirrors `putByPkAndTags`: failures are logged but **swallowed**, not
    /// returned. This matches the original's asymmetry with `putByPk` and
    /// is preserved deliberately rather than silently "fixed" — see
    /// `DESIGN.md`.
    fn put_by_pk_and_tags(&self, data: &[u8], set: &str, pk: &str, tags: &[String], ttl: Duration) {
        let aero_key = match self.create_key(set, pk) {
            Ok(key) => key,
            Err(err) => {
                self.logger.warning(&err.to_string());
                return;
            }
        };

        let prefix = self.cache_prefix.lock().clone();
        let prefixed_tags: Vec<String> = tags.iter().map(|tag| format!("{prefix}{tag}")).collect();

        let data_bin = as_bin!(DATA_BIN, data.to_vec());
        let tags_bin = as_bin!(TAGS_BIN, prefixed_tags);

        let mut policy = self.write_policy(ttl);
        if !self.put_timeout.is_zero() {
            policy.base_policy.timeout = Some(self.put_timeout);
        }

        if let Err(err) = self.client.put(&policy, &aero_key, &[data_bin, tags_bin]) {
            self.logger.warning(&format!(
                "could not put into set '{set}' by primary key '{pk}': {err}"
            ));
        }
    }

    fn remove_by_pk(&self, set: &str, pk: &str) -> Result<(), ByteCacheError> {
        let aero_key = self.create_key(set, pk)?;
        let policy = self.write_policy(Duration::from_secs(0));

        self.client
            .delete(&policy, &aero_key)
            .map(|_| ())
            .map_err(|err| ByteCacheError::Remote(err.into()))
    }

    /// Deletes every record tagged with `tag` in `set`. A single "empty
    /// digest hash" failure from the underlying driver is swallowed (logged
    /// at critical) rather than aborting the batch, mirroring the
    /// `recover()` wrapped around `removeByTag` in the original.
    fn remove_by_tag(&self, set: &str, tag: &str) -> Result<(), ByteCacheError> {
        let mut query_policy = QueryPolicy::default();
        query_policy.base_policy.timeout = Some(self.remove_timeout);
        query_policy.base_policy.max_retries = Some(self.max_retries);

        let write_policy = self.write_policy(Duration::from_secs(0));

        let prefix = self.cache_prefix.lock().clone();
        let mut statement = Statement::new(&self.namespace, set, Bins::All);
        statement.add_filter(Filter::contains(
            TAGS_BIN,
            CollectionIndexType::List,
            format!("{prefix}{tag}"),
        ));

        let record_set = self
            .client
            .query(&query_policy, statement)
            .map_err(|err| ByteCacheError::TagRemovalFailed {
                tag: tag.to_string(),
                source: err.into(),
            })?;

        for result in &*record_set {
            match result {
                Ok(record) => {
                    if let Some(key) = &record.key {
                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            self.client.delete(&write_policy, key)
                        }));

                        match outcome {
                            Ok(Ok(_)) => {}
                            Ok(Err(err)) => {
                                self.logger
                                    .critical(&format!("Empty record {set} : {tag}: {err}"));
                            }
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                self.logger.critical(&format!(
                                    "driver panicked removing tag {tag} in set {set}: {message}"
                                ));
                                return Err(ByteCacheError::TagRemovePanic {
                                    tag: tag.to_string(),
                                    message,
                                });
                            }
                        }
                    }
                }
                Err(err) => {
                    self.logger.critical(&err.to_string());
                }
            }
        }

        Ok(())
    }

    fn start_connection_count_metric(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            self.logger.warning(
                "byte_cache: no Tokio runtime active, connection-count metric will not be reported",
            );
            return;
        }

        let (tx, mut rx) = mpsc::channel(1);
        *self.quit_tx.lock() = Some(tx);

        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.connection_count_metric_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => cache.update_connection_count_metric(),
                    _ = rx.recv() => return,
                }
            }
        });

        *self.connection_count_task.lock() = Some(handle);
    }

    fn update_connection_count_metric(&self) {
        for node in self.client.nodes() {
            let host = node.name().to_string();
            if node.is_active() {
                match node.connection_count() {
                    Ok(count) => self.metric.set_item_count(&host, count as i64),
                    Err(err) => {
                        self.logger
                            .warning(&format!("Cannot get statistic for node {host}: {err}"));
                    }
                }
            } else {
                self.metric.set_item_count(&host, 0);
            }
        }
    }
}

impl ByteCache for AerospikeByteCache {
    fn count(&self) -> usize {
        // FIXME: never implemented upstream either; preserved as a stub.
        0
    }

    fn get(&self, key: &Key) -> Option<Vec<u8>> {
        let started = Instant::now();

        let aero_key = match self.create_key(&key.set, &key.pk) {
            Ok(key) => key,
            Err(err) => {
                self.logger.warning(&err.to_string());
                self.metric.register_miss(&key.set);
                return None;
            }
        };

        let result = self
            .client
            .get(&self.read_policy, &aero_key, Bins::Some(vec![DATA_BIN.to_string()]));

        let data = match &result {
            Ok(record) => record
                .bins
                .get(DATA_BIN)
                .and_then(|value| value.as_blob())
                .map(|bytes| bytes.to_vec()),
            Err(_) => None,
        };

        match &data {
            Some(_) => self.metric.register_hit(&key.set),
            None => self.metric.register_miss(&key.set),
        }
        self.metric.observe_rt(
            &key.set,
            "get",
            result.is_err(),
            since_ms(started),
        );

        data
    }

    fn put(&self, data: &[u8], key: &Key, ttl: Duration) {
        let started = Instant::now();

        if key.tags.is_empty() {
            let result = self.put_by_pk(data, &key.set, &key.pk, ttl);
            self.metric
                .observe_rt(&key.set, "put", result.is_err(), since_ms(started));
        } else {
            self.put_by_pk_and_tags(data, &key.set, &key.pk, &key.tags, ttl);
            self.metric.observe_rt(&key.set, "put", false, since_ms(started));
        }
    }

    fn remove(&self, key: &Key) -> Result<(), ByteCacheError> {
        let started = Instant::now();
        let mut result = Ok(());

        if !key.pk.is_empty() {
            result = self.remove_by_pk(&key.set, &key.pk);
        }

        if result.is_ok() {
            for tag in &key.tags {
                if let Err(err) = self.remove_by_tag(&key.set, tag) {
                    result = Err(err);
                    break;
                }
            }
        }

        self.metric
            .observe_rt(&key.set, "delete", result.is_err(), since_ms(started));
        result
    }

    fn close(&self) {
        if let Some(tx) = self.quit_tx.lock().take() {
            let _ = tx.try_send(());
        }
        self.client.close();
    }

    fn clear_set(&self, set: &str) -> Result<(), ByteCacheError> {
        let mut policy = ScanPolicy::default();
        policy.base_policy.priority = Priority::Default;

        let record_set = self
            .client
            .scan(&policy, &self.namespace, set, Bins::None)
            .map_err(|err| ByteCacheError::Remote(err.into()))?;

        let write_policy = WritePolicy::default();
        for result in &*record_set {
            match result {
                Ok(record) => {
                    if let Some(key) = &record.key {
                        self.client
                            .delete(&write_policy, key)
                            .map_err(|err| ByteCacheError::Remote(err.into()))?;
                    }
                }
                Err(err) => {
                    self.logger
                        .warning(&format!("Record error while clearing set {set}: {err}"));
                }
            }
        }

        self.logger.debug(&format!("Cache set {set} cleared"));
        Ok(())
    }

    fn scan_keys(&self, set: &str) -> Result<Vec<Key>, ByteCacheError> {
        let mut policy = ScanPolicy::default();
        policy.base_policy.priority = Priority::Low;

        let record_set = self
            .client
            .scan(
                &policy,
                &self.namespace,
                set,
                Bins::Some(vec!["id".to_string(), "tags".to_string()]),
            )
            .map_err(|err| ByteCacheError::Remote(err.into()))?;

        let mut keys = Vec::new();
        for result in &*record_set {
            let record = match result {
                Ok(record) => record,
                Err(_) => continue,
            };

            let Some(pk) = record.bins.get("id").and_then(|v| v.as_string()) else {
                self.logger
                    .warning(&format!("BINS `id` not found for aerospike set: {set:?}"));
                continue;
            };

            let Some(tags) = record.bins.get("tags").and_then(|v| v.as_string_list()) else {
                self.logger
                    .warning(&format!("BINS `tags` not found for aerospike set: {set:?}"));
                continue;
            };

            keys.push(Key::with_tags(set, pk, tags));
        }

        Ok(keys)
    }
}

impl Flushable for AerospikeByteCache {
    fn flush(&self) -> usize {
        // FIXME: never implemented upstream either; preserved as a stub.
        0
    }
}

impl Drop for AerospikeByteCache {
    fn drop(&mut self) {
        if let Some(tx) = self.quit_tx.lock().take() {
            let _ = tx.try_send(());
        }
    }
}

impl std::fmt::Debug for AerospikeByteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AerospikeByteCache")
            .field("namespace", &self.namespace)
            .field("cache_prefix", &*self.cache_prefix.lock())
            .finish()
    }
}
