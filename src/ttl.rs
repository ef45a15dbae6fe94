//! Named TTL constants mirrored from the original cache's `ttls.go`.

use std::time::Duration;

/// Five minutes. Used for hot, fast-changing data.
pub const SMALL_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Thirty minutes. The TTL most call sites reach for first.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Two hours.
pub const TWO_H_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Twenty-four hours.
pub const LONG_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Thirty days.
pub const VERY_LONG_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Roughly ten years, for data that for practical purposes never expires.
pub const ETERNAL_LONG_CACHE_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
