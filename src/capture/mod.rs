//! Request context capture subsystem.
//!
//! # Data Flow
//! ```text
//! http::Request (headers, uri, extensions)
//!     → context.rs (owned snapshot: RequestContext / ContextValue tree)
//!     → [moved into the logging task]
//!     → sanitize.rs (drop everything that is not map/list/string/number)
//!     → LogRecord.context
//! ```
//!
//! # Design Decisions
//! - The snapshot owns all of its data; it never borrows from the live request
//! - Values that cannot be shipped (bytes, opaque handles, booleans, nulls)
//!   are still representable so upstream layers can attach anything they like
//! - Sanitization runs on the worker, never on the request path

pub mod context;
pub mod sanitize;

pub use context::{ContextValue, RequestContext};
pub use sanitize::sanitize;
