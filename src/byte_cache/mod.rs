//! Byte-oriented remote cache, keyed by composite `(set, pk, tags)`
//! identifiers, with tag-based bulk invalidation.
//!
//! Ported from `examples/original_source/byte_cache_interface.go` and its
//! siblings. The production backing store is Aerospike
//! ([`aerospike`] module, gated behind the `aerospike` feature); the
//! [`BlackholeByteCache`] and [`AvailabilityCacheWrapper`] work regardless
//! of which concrete store is plugged in.

#[cfg(feature = "aerospike")]
pub mod aerospike;
mod blackhole;
pub mod config;
mod wrapper;

pub use blackhole::BlackholeByteCache;
pub use wrapper::AvailabilityCacheWrapper;

use std::time::Duration;

use crate::error::ByteCacheError;
use crate::flushable::Flushable;
use crate::key::Key;

/// A remote, byte-oriented cache keyed by [`Key`].
pub trait ByteCache: Flushable + Send + Sync {
    /// Total number of entries currently stored.
    fn count(&self) -> usize;

    /// Returns the stored bytes for `key`, if present and unexpired.
    fn get(&self, key: &Key) -> Option<Vec<u8>>;

    /// Stores `data` under `key` with the given TTL.
    fn put(&self, data: &[u8], key: &Key, ttl: Duration);

    /// Removes the entry for `key.pk` (if non-empty) and every entry
    /// carrying one of `key.tags`. Stops at the first tag removal failure,
    /// leaving earlier tags already removed.
    fn remove(&self, key: &Key) -> Result<(), ByteCacheError>;

    /// Releases any background resources held by this cache.
    fn close(&self);

    /// Removes every entry in `set`.
    fn clear_set(&self, set: &str) -> Result<(), ByteCacheError>;

    /// Returns every key currently present in `set`.
    fn scan_keys(&self, set: &str) -> Result<Vec<Key>, ByteCacheError>;
}
