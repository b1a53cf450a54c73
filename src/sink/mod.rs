//! Log sink adapters.
//!
//! # Data Flow
//! ```text
//! delivery.rs
//!     → LogSink::put_record(stream_name, data, partition_key)
//!         → http.rs   (remote ingestion endpoint over HTTP)
//!         → memory.rs (in-process buffer, tests and local runs)
//! ```
//!
//! # Design Decisions
//! - The sink is an opaque capability; connection details never leak past it
//! - `put_record` may fail; the dispatcher reports the error and moves on
//! - No retries: delivery is best effort

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use self::http::HttpSink;
pub use self::memory::{MemorySink, StoredRecord};

/// Errors raised by a sink while delivering a record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or protocol failure talking to the sink.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("sink rejected record with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The sink cannot accept records right now.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Remote store that accepts serialized log records.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Write one serialized record to `stream_name`, routed by `partition_key`.
    async fn put_record(
        &self,
        stream_name: &str,
        data: String,
        partition_key: &str,
    ) -> Result<(), SinkError>;
}
