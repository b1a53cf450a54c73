//! Tower middleware that feeds the access log.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::http::{Request, Response};
use bytes::Bytes;
use futures_util::FutureExt;
use tower::{Layer, Service};

use crate::capture::RequestContext;
use crate::http::body::{BodyCapture, LoggedBody, PendingRecord};
use crate::pipeline::AccessLog;
use crate::record::outcome::header_map;
use crate::record::Outcome;

/// Layer that wraps services with [`AccessLogService`].
#[derive(Clone, Debug)]
pub struct AccessLogLayer {
    log: AccessLog,
}

impl AccessLogLayer {
    pub fn new(log: AccessLog) -> Self {
        Self { log }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            log: self.log.clone(),
        }
    }
}

/// Times the inner service and submits exactly one record per call.
///
/// The caller always sees exactly what the inner service produced: the same
/// response (its body streamed through unchanged), the same error, or the
/// same panic. A call whose future is dropped before the inner service
/// returns is logged as cancelled.
#[derive(Clone, Debug)]
pub struct AccessLogService<S> {
    inner: S,
    log: AccessLog,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Display + Send + 'static,
    ResBody: http_body::Body<Data = Bytes> + Send + 'static,
{
    type Response = Response<LoggedBody<ResBody>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let in_flight = InFlight::start(self.log.clone(), RequestContext::from_request(&request));

        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(request))) {
            Ok(fut) => fut,
            Err(panic) => {
                in_flight.fail(Outcome::from_panic(panic.as_ref()));
                std::panic::resume_unwind(panic)
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(response)) => {
                    let log = in_flight.log.clone();
                    let (mut context, elapsed) = in_flight.complete();
                    let (parts, body) = response.into_parts();

                    if let Some(extra) = parts.extensions.get::<RequestContext>() {
                        context.merge(extra.clone());
                    }

                    let capture =
                        BodyCapture::for_headers(&parts.headers, log.max_non_json_body_chunks());
                    let pending = PendingRecord {
                        log,
                        context,
                        status: parts.status.as_u16(),
                        headers: header_map(&parts.headers),
                        elapsed,
                    };

                    Ok(Response::from_parts(
                        parts,
                        LoggedBody::new(body, capture, pending),
                    ))
                }
                Ok(Err(error)) => {
                    tracing::debug!(error = %error, "Inner service failed, logging failure record");
                    in_flight.fail(Outcome::from_service_error(&error));
                    Err(error)
                }
                Err(panic) => {
                    in_flight.fail(Outcome::from_panic(panic.as_ref()));
                    std::panic::resume_unwind(panic)
                }
            }
        })
    }
}

/// Context of a call whose inner service has not returned yet.
///
/// Dropping it while still armed logs the call as cancelled.
struct InFlight {
    log: AccessLog,
    context: Option<RequestContext>,
    started: Instant,
}

impl InFlight {
    fn start(log: AccessLog, context: RequestContext) -> Self {
        Self {
            log,
            context: Some(context),
            started: Instant::now(),
        }
    }

    /// Disarm and hand back the context with the time spent in the inner service.
    fn complete(mut self) -> (RequestContext, Duration) {
        (self.context.take().unwrap_or_default(), self.started.elapsed())
    }

    fn fail(mut self, outcome: Outcome) {
        if let Some(context) = self.context.take() {
            self.log
                .log(context.into_value(), outcome, self.started.elapsed());
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            tracing::debug!("Request dropped before the inner service returned");
            self.log.log(
                context.into_value(),
                Outcome::cancelled(),
                self.started.elapsed(),
            );
        }
    }
}
