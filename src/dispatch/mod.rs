//! Asynchronous dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! request path (many concurrent tasks)
//!     → Dispatcher::submit (non-blocking enqueue)
//!     → mpsc queue (bounded or unbounded)
//!     → worker.rs (single consumer, FIFO, one task at a time)
//!         → task Ok: done
//!         → task Err / panic: reporter.rs (Reporter::capture)
//! ```
//!
//! # Design Decisions
//! - Exactly one worker per pipeline; ordering is submission order
//! - `submit` never waits; a full bounded queue drops the record and reports it
//! - A failing or panicking task never stops the worker
//! - Shutdown drains everything already queued

pub mod error;
pub mod reporter;
pub mod worker;

pub use error::{BoxError, LogError};
pub use reporter::{Reporter, TracingReporter};
pub use worker::{Dispatcher, LogTask};
