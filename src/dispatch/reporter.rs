//! Out-of-band reporting for logging-path failures.

use crate::dispatch::error::LogError;

/// Receives every error raised while building or delivering a record.
///
/// Called from the dispatcher worker (and from `submit` when the queue
/// refuses a task). Implementations must not panic.
pub trait Reporter: Send + Sync {
    fn capture(&self, error: &LogError);
}

/// Default reporter: emits a structured `tracing` error event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn capture(&self, error: &LogError) {
        tracing::error!(kind = error.kind(), error = %error, "Access log record dropped");
    }
}

impl<F> Reporter for F
where
    F: Fn(&LogError) + Send + Sync,
{
    fn capture(&self, error: &LogError) {
        self(error)
    }
}
