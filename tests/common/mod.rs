//! Shared utilities for middleware and failure injection tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use remote_access_log::sink::SinkError;
use remote_access_log::{AccessLog, AccessLogConfig, LogError, LogSink, MemorySink, RequestContext};
use tower::ServiceExt;

/// Configuration with a stream name and a small chunk limit.
pub fn test_config() -> AccessLogConfig {
    AccessLogConfig {
        stream_name: "test-stream".to_string(),
        max_non_json_body_chunks: 2,
        ..AccessLogConfig::default()
    }
}

/// Reporter that records the kind of every error it sees.
#[derive(Clone, Default)]
pub struct Collected {
    errors: Arc<Mutex<Vec<&'static str>>>,
}

impl Collected {
    pub fn reporter(&self) -> impl Fn(&LogError) + Send + Sync + 'static {
        let errors = self.errors.clone();
        move |error: &LogError| errors.lock().unwrap().push(error.kind())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.errors.lock().unwrap().clone()
    }
}

/// Sink that takes `delay` before accepting each record.
#[derive(Clone)]
pub struct SlowSink {
    pub delay: Duration,
    pub inner: MemorySink,
}

#[async_trait]
impl LogSink for SlowSink {
    async fn put_record(
        &self,
        stream_name: &str,
        data: String,
        partition_key: &str,
    ) -> Result<(), SinkError> {
        tokio::time::sleep(self.delay).await;
        self.inner.put_record(stream_name, data, partition_key).await
    }
}

/// Sink that rejects the first `failures` records and accepts the rest.
#[derive(Clone)]
pub struct FlakySink {
    remaining: Arc<Mutex<usize>>,
    pub inner: MemorySink,
}

impl FlakySink {
    pub fn new(failures: usize) -> Self {
        Self {
            remaining: Arc::new(Mutex::new(failures)),
            inner: MemorySink::new(),
        }
    }
}

#[async_trait]
impl LogSink for FlakySink {
    async fn put_record(
        &self,
        stream_name: &str,
        data: String,
        partition_key: &str,
    ) -> Result<(), SinkError> {
        {
            let mut remaining = self.remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SinkError::Unavailable("stream offline".to_string()));
            }
        }
        self.inner.put_record(stream_name, data, partition_key).await
    }
}

fn chunked(content_type: &'static str, chunks: &[&'static str]) -> Response {
    let frames: Vec<Result<Bytes, std::io::Error>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
        .collect();
    (
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(futures_util::stream::iter(frames)),
    )
        .into_response()
}

async fn text() -> Response {
    chunked("text/plain", &["a", "b", "c", "d", "e"])
}

async fn json_stream() -> Response {
    chunked("application/json", &["{\"items\":[", "1,", "2,", "3", "]}"])
}

async fn enriched() -> Response {
    let mut context = RequestContext::new();
    context.insert("user_id", 42i64);
    context.insert("handler_state", remote_access_log::ContextValue::opaque::<Router>());

    let mut response = Json(serde_json::json!({ "ok": true })).into_response();
    response.extensions_mut().insert(context);
    response
}

async fn missing() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing here")
}

/// Router with the sample routes, wrapped in the access log layer.
pub fn app(log: &AccessLog) -> Router {
    Router::new()
        .route("/text", get(text))
        .route("/json", get(json_stream))
        .route("/enriched", get(enriched))
        .route("/missing", get(missing))
        .route("/slow", get(|| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            "done"
        }))
        .layer(log.layer())
}

/// Send one request through `app` and read the whole response body.
pub async fn send(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}
