#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

//! Crate root: module map for the three cache tiers plus the shared
//! capability traits (`Logger`, `MetricSink`, `Flushable`) and value types
//! (`Key`, TTL constants, error kinds) they're all built on.

pub mod auto_cache;
pub mod byte_cache;
pub mod error;
pub mod flushable;
pub mod key;
pub mod logger;
pub mod metric;
pub mod struct_cache;
pub mod ttl;

pub use flushable::Flushable;
pub use key::Key;
pub use logger::{Logger, NilLogger, TracingLogger};
pub use metric::{MetricSink, MetricsCrateSink, NullMetricSink};
