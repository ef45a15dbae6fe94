//! A single timestamped, TTL-bounded value held by a [`super::StructCache`].

use std::time::{SystemTime, UNIX_EPOCH};

/// One cached value plus the bookkeeping needed to decide whether it is
/// still valid.
///
/// Mirrors `examples/original_source/entry.go`'s `Entry` type. `end_date` is
/// stored as a Unix timestamp (seconds) rather than a `time.Time` so that
/// validity checks are a cheap integer comparison, matching the original's
/// `IsValid` implementation.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// When this entry was first created (not updated on renewal).
    create_date: SystemTime,
    /// Unix timestamp, in seconds, after which this entry is no longer valid.
    end_date: i64,
    /// The cached value.
    data: V,
}

impl<V> Entry<V> {
    /// Creates a new entry that becomes invalid after `ttl` elapses from now.
    pub fn new(data: V, ttl: std::time::Duration) -> Self {
        let now = SystemTime::now();
        let end_date = now
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs() as i64
            + ttl.as_secs() as i64;

        Self {
            create_date: now,
            end_date,
            data,
        }
    }

    /// Returns `true` if this entry's TTL has not yet elapsed.
    pub fn is_valid(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs() as i64;
        self.end_date > now
    }

    /// The time this entry was created. Unaffected by renewal via
    /// [`Entry::renew`].
    pub fn create_date(&self) -> SystemTime {
        self.create_date
    }

    /// Borrows the cached value.
    pub fn data(&self) -> &V {
        &self.data
    }

    /// Overwrites the value and pushes the expiry out by `ttl` from now,
    /// without touching `create_date`. Mirrors the renewal branch of the
    /// original `cacheSet.put`.
    pub fn renew(&mut self, data: V, ttl: std::time::Duration) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs() as i64;
        self.end_date = now + ttl.as_secs() as i64;
        self.data = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fresh_entry_is_valid() {
        let entry = Entry::new("data", Duration::from_secs(60));
        assert!(entry.is_valid());
        assert_eq!(*entry.data(), "data");
    }

    #[test]
    fn zero_ttl_is_immediately_invalid() {
        let entry = Entry::new("data", Duration::from_secs(0));
        assert!(!entry.is_valid());
    }

    #[test]
    fn renew_keeps_create_date_but_updates_value_and_expiry() {
        let mut entry = Entry::new("data", Duration::from_secs(0));
        let created = entry.create_date();
        entry.renew("data2", Duration::from_secs(60));
        assert_eq!(*entry.data(), "data2");
        assert_eq!(entry.create_date(), created);
        assert!(entry.is_valid());
    }
}
