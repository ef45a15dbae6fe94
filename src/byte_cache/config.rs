//! Configuration for the Aerospike-backed remote byte cache.
//!
//! Field names and defaults are ported directly from
//! `examples/original_source/byte_cache_aerospike_config.go`.

use std::time::Duration;

/// Configuration for [`super::aerospike::AerospikeByteCache`].
#[derive(Debug, Clone)]
pub struct AerospikeConfig {
    /// Prepended to every pk and tag before it reaches the backing store.
    pub prefix: String,
    /// Aerospike namespace. Required; must be non-empty.
    pub namespace: String,
    /// `host:port` addresses of the cluster's seed nodes. Required;
    /// must contain at least one non-empty entry.
    pub hosts: Vec<String>,
    /// Max retries for get/put operations.
    pub max_retries: usize,
    /// Sleep between connection/read/write retries.
    pub sleep_between_retries: Duration,
    /// TCP connection timeout.
    pub connection_timeout: Duration,
    /// Max unused connection lifetime.
    pub idle_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Remove (tag-query) timeout.
    pub remove_timeout: Duration,
    /// Put timeout, applied only to tagged puts.
    pub put_timeout: Duration,
    /// Max connection pool (queue) size.
    pub connection_queue_size: usize,
    /// If true, wait for a used connection to free up rather than opening
    /// a new one past `connection_queue_size`.
    pub limit_connections_to_queue_size: bool,
    /// Aerospike client log level: `DEBUG(-1)`, `INFO(0)`, `WARNING(1)`,
    /// `ERR(2)`, `OFF(999)`.
    pub log_level: i32,
    /// If true, client construction fails immediately when no node in the
    /// cluster can be reached.
    pub fail_if_not_connected: bool,
    /// How often to refresh the per-node connection-count gauge.
    pub update_connection_count_metric_interval: Duration,
}

impl Default for AerospikeConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            namespace: String::new(),
            hosts: Vec::new(),
            max_retries: 3,
            sleep_between_retries: Duration::from_millis(500),
            connection_timeout: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_millis(100),
            remove_timeout: Duration::from_millis(800),
            put_timeout: Duration::from_millis(500),
            connection_queue_size: 256,
            limit_connections_to_queue_size: false,
            log_level: 1,
            fail_if_not_connected: false,
            update_connection_count_metric_interval: Duration::from_secs(1),
        }
    }
}

/// A secondary index to create over the `tags` bin of a set, enabling
/// `ContainsFilter` tag queries. Ported from
/// `examples/original_source/byte_cache_aerospike_indexes.go`.
#[derive(Debug, Clone)]
pub struct AerospikeIndex {
    /// The Aerospike set this index applies to.
    pub set_name: String,
    /// The index's name, used for `CREATE INDEX ... IF NOT EXISTS` style
    /// idempotency (an `IndexFound` error on creation is treated as success).
    pub index_name: String,
}
