//! HTTP middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → layer.rs (start timer, snapshot RequestContext)
//!     → inner service
//!         → Err(e)  : submit Failure record, return Err(e)
//!         → panic   : submit Failure record, resume panic
//!         → Ok(resp): body.rs wraps the body
//!             → client consumes body, chunks copied on the way
//!             → end of stream / error / drop: submit Success record
//! ```
//!
//! # Design Decisions
//! - The response is never buffered; logging observes the stream as it passes
//! - Elapsed time is measured when the inner service returns
//! - Exactly one record per call, whichever way the call ends

pub mod body;
pub mod layer;

pub use body::{BodyCapture, LoggedBody};
pub use layer::{AccessLogLayer, AccessLogService};
