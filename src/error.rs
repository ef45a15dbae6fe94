//! Error types for each cache subsystem.

use thiserror::Error;

/// Errors returned by [`crate::struct_cache::StructCache`].
#[derive(Debug, Error)]
pub enum StructCacheError {
    /// `Put` was called with a TTL of zero or negative duration.
    #[error("ttl must be greater than zero")]
    InvalidTtl,

    /// `Put` was called against a cache whose default segment limit is not positive.
    #[error("default limit must be greater than zero")]
    InvalidLimit,

    /// `register_cache_set` was called for a set name that already exists.
    #[error("cache set already exists")]
    SetAlreadyExists,

    /// Lazy set creation during `Put` failed even after a concurrent
    /// creator was given a chance to win the race. Should not happen
    /// absent a programming error.
    #[error("could not create cache set {0}")]
    CannotCreateSet(String),
}

/// Errors returned by [`crate::auto_cache::AutoCache`].
#[derive(Debug, Error)]
pub enum AutoCacheError {
    /// The requested key has no registered entry.
    ///
    /// The message text intentionally preserves the original implementation's
    /// typo ("nof" instead of "not") for backwards compatibility with callers
    /// that pattern-match on the exact string.
    #[error("Auto cache key {0} nof found")]
    KeyNotFound(String),

    /// An entry exists but has not produced a value yet.
    #[error("Value is not set")]
    ValueNotSet,

    /// The updater function failed during the synchronous bootstrap call
    /// made when an entry is first started.
    #[error("updater failed: {0}")]
    UpdaterFailed(#[source] anyhow::Error),
}

/// Errors returned by [`crate::byte_cache::ByteCache`] implementations.
#[derive(Debug, Error)]
pub enum ByteCacheError {
    /// The configured namespace was empty.
    #[error("namespace must not be empty")]
    EmptyNamespace,

    /// The configured host list was empty.
    #[error("hosts must not be empty")]
    EmptyHosts,

    /// A host entry could not be parsed as `host:port`.
    #[error("invalid host address: {0}")]
    InvalidHostAddress(String),

    /// The remote store rejected a read, write, or delete.
    #[error("remote cache error: {0}")]
    Remote(#[source] anyhow::Error),

    /// A tag-based removal stopped partway through because one of the
    /// tagged deletes failed; earlier tags in the list were already removed.
    #[error("failed removing tag {tag}: {source}")]
    TagRemovalFailed {
        /// The tag whose removal failed.
        tag: String,
        /// The underlying remote-store error.
        #[source]
        source: anyhow::Error,
    },

    /// The driver panicked while deleting a tagged record (a known issue
    /// with empty digest hashes) and the panic was caught and converted
    /// into this error rather than unwinding past the library boundary.
    #[error("driver panicked removing tag {tag}: {message}")]
    TagRemovePanic {
        /// The tag being removed when the driver panicked.
        tag: String,
        /// Best-effort description of the panic payload.
        message: String,
    },
}
