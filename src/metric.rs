//! Metrics capability set, backed by the `metrics` facade crate.
//!
//! Mirrors the original `Metric` interface and its label vocabulary
//! (`examples/original_source/metric/metric.go`), but instead of taking a
//! caller-built label map, each method takes the handful of dimensions the
//! call site actually has and forwards them as `metrics` crate labels.

use std::time::Instant;

/// `host` label key.
pub const LABEL_HOST: &str = "host";
/// `is_error` label key.
pub const LABEL_IS_ERROR: &str = "is_error";
/// `namespace` label key.
pub const LABEL_NAMESPACE: &str = "namespace";
/// `set` label key.
pub const LABEL_SET: &str = "set";
/// `operation` label key.
pub const LABEL_OPERATION: &str = "operation";

/// A sink that cache operations report timing and counters through.
pub trait MetricSink: Send + Sync {
    /// Records the duration of an operation, in milliseconds.
    fn observe_rt(&self, set: &str, operation: &str, is_error: bool, millis: f64);

    /// Records a cache hit for `set`.
    fn register_hit(&self, set: &str);

    /// Records a cache miss for `set`.
    fn register_miss(&self, set: &str);

    /// Increments the tracked item count for `set` by one.
    fn increase_item_count(&self, set: &str);

    /// Sets the tracked item count for `set` (or, for the remote cache's
    /// connection-count gauge, for `host`) to an absolute value.
    fn set_item_count(&self, set: &str, n: i64);
}

/// Returns the elapsed time since `started`, in milliseconds, matching the
/// original `metric.SinceMs` helper's units (Prometheus prefers milliseconds).
pub fn since_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Reports operations through the process-global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsCrateSink;

impl MetricSink for MetricsCrateSink {
    fn observe_rt(&self, set: &str, operation: &str, is_error: bool, millis: f64) {
        metrics::histogram!(
            "cache_operation_duration_ms",
            LABEL_SET => set.to_string(),
            LABEL_OPERATION => operation.to_string(),
            LABEL_IS_ERROR => if is_error { "1" } else { "0" },
        )
        .record(millis);
    }

    fn register_hit(&self, set: &str) {
        metrics::counter!("cache_hits_total", LABEL_SET => set.to_string()).increment(1);
    }

    fn register_miss(&self, set: &str) {
        metrics::counter!("cache_misses_total", LABEL_SET => set.to_string()).increment(1);
    }

    fn increase_item_count(&self, set: &str) {
        metrics::gauge!("cache_item_count", LABEL_SET => set.to_string()).increment(1.0);
    }

    fn set_item_count(&self, set: &str, n: i64) {
        metrics::gauge!("cache_item_count", LABEL_SET => set.to_string()).set(n as f64);
    }
}

/// Discards every measurement. Useful in tests and as the default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn observe_rt(&self, _set: &str, _operation: &str, _is_error: bool, _millis: f64) {}
    fn register_hit(&self, _set: &str) {}
    fn register_miss(&self, _set: &str) {}
    fn increase_item_count(&self, _set: &str) {}
    fn set_item_count(&self, _set: &str, _n: i64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn since_ms_reports_milliseconds() {
        let started = Instant::now() - Duration::from_millis(50);
        let elapsed = since_ms(started);
        assert!(elapsed >= 50.0);
    }

    #[test]
    fn null_sink_is_inert() {
        let sink = NullMetricSink;
        sink.observe_rt("set", "get", false, 1.0);
        sink.register_hit("set");
        sink.register_miss("set");
        sink.increase_item_count("set");
        sink.set_item_count("set", 5);
    }
}
