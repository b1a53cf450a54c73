//! Log record subsystem.
//!
//! # Data Flow
//! ```text
//! Outcome (Success | Failure) + captured context + elapsed time
//!     → format.rs (status/body/headers or class/message/backtrace,
//!                  non-JSON bodies capped at max_non_json_body_chunks)
//!     → builder.rs (sanitize context, timestamp, preprocessor hook)
//!     → delivery.rs (serialize to JSON, put_record on the sink)
//! ```
//!
//! # Design Decisions
//! - Everything here runs on the dispatcher worker
//! - The outcome is an explicit tagged union set by the middleware
//! - JSON bodies are kept whole so downstream consumers can parse them

pub mod builder;
pub mod delivery;
pub mod format;
pub mod outcome;

pub use builder::{LogRecord, Preprocessor, RecordBuilder};
pub use delivery::{deliver, Route};
pub use format::FormattedResponse;
pub use outcome::{BodyExtractable, Outcome};
