//! A no-op [`ByteCache`] that accepts writes and reports misses on reads.
//! Ported from `examples/original_source/byte_cache_blackhole.go`. Used
//! while a real backing store is still connecting, and in tests.

use std::time::Duration;

use super::ByteCache;
use crate::error::ByteCacheError;
use crate::flushable::Flushable;
use crate::key::Key;

/// See module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlackholeByteCache;

impl ByteCache for BlackholeByteCache {
    fn count(&self) -> usize {
        0
    }

    fn get(&self, _key: &Key) -> Option<Vec<u8>> {
        None
    }

    fn put(&self, _data: &[u8], _key: &Key, _ttl: Duration) {}

    fn remove(&self, _key: &Key) -> Result<(), ByteCacheError> {
        Ok(())
    }

    fn close(&self) {}

    fn clear_set(&self, _set: &str) -> Result<(), ByteCacheError> {
        Ok(())
    }

    fn scan_keys(&self, _set: &str) -> Result<Vec<Key>, ByteCacheError> {
        Ok(Vec::new())
    }
}

impl Flushable for BlackholeByteCache {
    fn flush(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_is_a_harmless_no_op() {
        let cache = BlackholeByteCache;
        let key = Key::new("set", "pk");

        cache.put(b"data", &key, Duration::from_secs(60));
        assert_eq!(cache.get(&key), None);
        assert!(cache.remove(&key).is_ok());
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.flush(), 0);
        assert!(cache.clear_set("set").is_ok());
        assert_eq!(cache.scan_keys("set").unwrap(), Vec::<Key>::new());
        cache.close();
    }
}
