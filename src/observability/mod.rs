//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, sinks, middleware produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - This is the crate's own telemetry, separate from the access records it ships
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
