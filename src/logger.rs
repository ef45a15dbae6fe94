//! Logging capability set used across all three cache tiers.
//!
//! Mirrors the capability-set shape of the original `IStructCacheLogger` /
//! `IAutoCacheLogger` / `IAerospikeCacheLogger` interfaces, but emits through
//! [`tracing`] instead of a hand-rolled sink so callers get structured,
//! level-filterable output for free.

/// A logging sink a cache can report diagnostics through.
///
/// The default implementation of every method is a no-op except
/// [`Logger::is_debug_enabled`], which defaults to `false`; implementors
/// only need to override the levels they care about.
pub trait Logger: Send + Sync {
    /// Returns whether debug-level logging is currently enabled.
    ///
    /// Callers use this to skip formatting expensive debug messages when
    /// nobody will read them.
    fn is_debug_enabled(&self) -> bool {
        false
    }

    /// Logs a debug-level message.
    fn debug(&self, _message: &str) {}

    /// Logs a warning-level message.
    fn warning(&self, _message: &str) {}

    /// Logs an error-level message.
    fn error(&self, _message: &str) {}

    /// Logs a critical/fatal-level message, typically from a recovered panic.
    fn critical(&self, _message: &str) {}

    /// Logs a plain, unleveled message. Mirrors the original's `Printf`.
    fn print(&self, _message: &str) {}
}

/// Routes every level through the corresponding `tracing` macro.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn is_debug_enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn critical(&self, message: &str) {
        tracing::error!(critical = true, "{message}");
    }

    fn print(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Discards every message. Equivalent to the original `NilLogger`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NilLogger;

impl Logger for NilLogger {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_logger_is_silent_and_debug_disabled() {
        let logger = NilLogger;
        assert!(!logger.is_debug_enabled());
        logger.debug("unseen");
        logger.warning("unseen");
        logger.error("unseen");
        logger.critical("unseen");
        logger.print("unseen");
    }
}
