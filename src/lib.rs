//! Asynchronous, sanitizing HTTP access logging for tower and axum services.
//!
//! Every request passing through [`AccessLogLayer`] produces exactly one
//! structured JSON record. Records are built and shipped to a [`LogSink`] by a
//! single background worker, so neither sink latency nor logging failures are
//! visible to the request path.

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod sink;

pub use capture::{ContextValue, RequestContext};
pub use config::{AccessLogConfig, ConfigError};
pub use dispatch::{LogError, Reporter, TracingReporter};
pub use http::AccessLogLayer;
pub use pipeline::{AccessLog, AccessLogBuilder};
pub use record::{LogRecord, Outcome};
pub use sink::{HttpSink, LogSink, MemorySink};
