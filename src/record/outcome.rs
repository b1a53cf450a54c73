//! What the wrapped handler produced.

use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use axum::http::HeaderMap;
use bytes::Bytes;

use crate::dispatch::error::panic_message;

/// Error class recorded when the handler panicked instead of returning.
pub const PANIC_CLASS: &str = "panic";

/// Error class recorded when the request was dropped before the handler returned.
pub const CANCELLED_CLASS: &str = "cancelled";

type DynError = dyn Error + 'static;

/// Result of a single handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler produced a response.
    Success {
        status: u16,
        headers: BTreeMap<String, String>,
        body: Vec<Bytes>,
    },
    /// The handler failed or panicked.
    Failure {
        error_class: String,
        message: String,
        backtrace: Vec<String>,
    },
}

impl Outcome {
    /// Build a success outcome, normalizing `body` to a list of chunks.
    pub fn success(
        status: u16,
        headers: BTreeMap<String, String>,
        body: impl BodyExtractable,
    ) -> Self {
        Outcome::Success {
            status,
            headers,
            body: body.into_chunks(),
        }
    }

    /// Build a failure outcome from a handler error.
    ///
    /// The class is the error's type name and the backtrace is the chain of
    /// `source()` messages, outermost first.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: Error + 'static,
    {
        Outcome::Failure {
            error_class: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            backtrace: source_chain(error),
        }
    }

    /// Build a failure outcome from a service error known only by `Display`.
    ///
    /// Boxed errors (`tower::BoxError` and friends) still yield their
    /// `source()` chain; other types are recorded by class and message.
    pub fn from_service_error<E>(error: &E) -> Self
    where
        E: Display + 'static,
    {
        Outcome::Failure {
            error_class: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            backtrace: boxed_error(error).map(source_chain).unwrap_or_default(),
        }
    }

    /// Build a failure outcome from a caught panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Outcome::Failure {
            error_class: PANIC_CLASS.to_string(),
            message: panic_message(payload),
            backtrace: Vec::new(),
        }
    }

    /// Failure outcome for a request whose future was dropped mid-flight.
    pub fn cancelled() -> Self {
        Outcome::Failure {
            error_class: CANCELLED_CLASS.to_string(),
            message: "request dropped before the handler returned".to_string(),
            backtrace: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

fn source_chain(error: &DynError) -> Vec<String> {
    let mut backtrace = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        backtrace.push(cause.to_string());
        source = cause.source();
    }
    backtrace
}

/// View `error` as a trait object when it is one of the standard boxed forms.
fn boxed_error(error: &dyn Any) -> Option<&DynError> {
    if let Some(e) = error.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        let e: &DynError = &**e;
        return Some(e);
    }
    if let Some(e) = error.downcast_ref::<Box<dyn Error + Send>>() {
        let e: &DynError = &**e;
        return Some(e);
    }
    if let Some(e) = error.downcast_ref::<Box<dyn Error>>() {
        return Some(&**e);
    }
    None
}

/// A response body that can hand over its own content as chunks.
pub trait BodyExtractable {
    fn into_chunks(self) -> Vec<Bytes>;
}

impl BodyExtractable for Bytes {
    fn into_chunks(self) -> Vec<Bytes> {
        vec![self]
    }
}

impl BodyExtractable for String {
    fn into_chunks(self) -> Vec<Bytes> {
        vec![Bytes::from(self)]
    }
}

impl BodyExtractable for &str {
    fn into_chunks(self) -> Vec<Bytes> {
        vec![Bytes::copy_from_slice(self.as_bytes())]
    }
}

impl BodyExtractable for Vec<u8> {
    fn into_chunks(self) -> Vec<Bytes> {
        vec![Bytes::from(self)]
    }
}

impl BodyExtractable for Vec<Bytes> {
    fn into_chunks(self) -> Vec<Bytes> {
        self
    }
}

impl BodyExtractable for Vec<String> {
    fn into_chunks(self) -> Vec<Bytes> {
        self.into_iter().map(Bytes::from).collect()
    }
}

impl BodyExtractable for Vec<&str> {
    fn into_chunks(self) -> Vec<Bytes> {
        self.into_iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }
}

/// Flatten response headers into a name → value map.
///
/// Repeated headers are joined with `", "`; non UTF-8 values are decoded
/// lossily.
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), joined);
    }
    map
}
