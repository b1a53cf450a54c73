//! Errors raised on the logging path.

use thiserror::Error;

use crate::sink::SinkError;

/// Boxed error type accepted from user hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Anything that goes wrong while building or delivering a record.
///
/// These never reach the request path. The dispatcher hands them to the
/// configured [`Reporter`](crate::dispatch::Reporter) and drops the record.
#[derive(Debug, Error)]
pub enum LogError {
    /// Record could not be serialized to JSON.
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The user-supplied preprocessor returned an error.
    #[error("preprocessor failed: {0}")]
    Preprocess(#[source] BoxError),

    /// The sink rejected the record or could not be reached.
    #[error("sink delivery failed: {0}")]
    Sink(#[from] SinkError),

    /// A logging task panicked.
    #[error("logging task panicked: {0}")]
    Panicked(String),

    /// The bounded queue was full when the record was submitted.
    #[error("log queue full (capacity {0}), record dropped")]
    QueueFull(usize),

    /// The worker has shut down and no longer accepts records.
    #[error("log worker stopped, record dropped")]
    WorkerStopped,
}

impl LogError {
    /// Short label used for metrics and structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            LogError::Serialize(_) => "serialize",
            LogError::Preprocess(_) => "preprocess",
            LogError::Sink(_) => "sink",
            LogError::Panicked(_) => "panic",
            LogError::QueueFull(_) => "queue_full",
            LogError::WorkerStopped => "worker_stopped",
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
