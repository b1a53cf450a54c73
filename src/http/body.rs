//! Response body wrapper that copies chunks for logging.
//!
//! The wrapped body streams to the client untouched. Data frames are copied
//! (reference-counted, no byte copy) into a [`BodyCapture`] until the body
//! ends, fails, or is dropped; at that point the record is submitted once.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::HeaderMap;
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

use crate::capture::RequestContext;
use crate::pipeline::AccessLog;
use crate::record::format::is_json_content_type;
use crate::record::{BodyExtractable, Outcome};

/// Chunks copied from a response body.
///
/// Keeps every chunk of a JSON response and at most `limit` chunks of
/// anything else.
#[derive(Debug, Default)]
pub struct BodyCapture {
    chunks: Vec<Bytes>,
    limit: Option<usize>,
}

impl BodyCapture {
    /// Choose the capture policy from the response headers.
    pub fn for_headers(headers: &HeaderMap, max_non_json_body_chunks: usize) -> Self {
        let json = headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);

        Self {
            chunks: Vec::new(),
            limit: (!json).then_some(max_non_json_body_chunks),
        }
    }

    pub fn push(&mut self, chunk: &Bytes) {
        if self.limit.map_or(true, |limit| self.chunks.len() < limit) {
            self.chunks.push(chunk.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl BodyExtractable for BodyCapture {
    fn into_chunks(self) -> Vec<Bytes> {
        self.chunks
    }
}

/// Everything known about a successful response except its body.
pub(crate) struct PendingRecord {
    pub(crate) log: AccessLog,
    pub(crate) context: RequestContext,
    pub(crate) status: u16,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) elapsed: Duration,
}

impl PendingRecord {
    fn submit(self, body: BodyCapture) {
        let outcome = Outcome::success(self.status, self.headers, body);
        self.log.log(self.context.into_value(), outcome, self.elapsed);
    }
}

pin_project! {
    /// Response body that reports itself to the access log once finished.
    pub struct LoggedBody<B> {
        #[pin]
        inner: B,
        capture: BodyCapture,
        pending: Option<PendingRecord>,
    }

    impl<B> PinnedDrop for LoggedBody<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(pending) = this.pending.take() {
                pending.submit(std::mem::take(this.capture));
            }
        }
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for LoggedBody<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggedBody")
            .field("inner", &self.inner)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl<B> LoggedBody<B> {
    pub(crate) fn new(inner: B, capture: BodyCapture, pending: PendingRecord) -> Self {
        Self {
            inner,
            capture,
            pending: Some(pending),
        }
    }
}

impl<B> Body for LoggedBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = this.inner.poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.push(data);
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => {
                if let Some(pending) = this.pending.take() {
                    pending.submit(std::mem::take(this.capture));
                }
            }
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
