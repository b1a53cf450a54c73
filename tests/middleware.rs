//! End-to-end tests for the access log middleware.

use std::convert::Infallible;
use std::io;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response, StatusCode};
use remote_access_log::{AccessLog, MemorySink, RequestContext};
use serde_json::{json, Value};
use tower::{service_fn, BoxError, Service, ServiceBuilder, ServiceExt};

mod common;

fn start(sink: &MemorySink) -> AccessLog {
    AccessLog::builder(common::test_config())
        .sink(sink.clone())
        .build()
        .unwrap()
}

fn only_record(sink: &MemorySink) -> Value {
    let records = sink.records();
    assert_eq!(records.len(), 1, "expected exactly one record");
    assert_eq!(records[0].stream_name, "test-stream");
    assert_eq!(records[0].partition_key, "partition1");
    records[0].json().unwrap()
}

#[tokio::test]
async fn test_success_record_fields() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let (status, body) = common::send(common::app(&log), "/slow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"done");

    log.shutdown().await;
    let record = only_record(&sink);

    assert_eq!(record["code"], 200);
    assert_eq!(record["body"], json!(["done"]));
    assert_eq!(record["headers"]["content-type"], "text/plain; charset=utf-8");
    assert!(record["responseTime"].as_f64().unwrap() >= 0.02);
    assert!(record["timestamp"].is_string());
    assert!(record.get("class").is_none());
}

#[tokio::test]
async fn test_client_sees_full_body_while_log_is_truncated() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let (_, body) = common::send(common::app(&log), "/text").await;
    assert_eq!(&body[..], b"abcde");

    log.shutdown().await;
    assert_eq!(only_record(&sink)["body"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_json_body_is_never_truncated() {
    let sink = MemorySink::new();
    let log = start(&sink);

    common::send(common::app(&log), "/json").await;

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["body"], json!(["{\"items\":[", "1,", "2,", "3", "]}"]));
    assert_eq!(record["headers"]["content-type"], "application/json");
}

#[tokio::test]
async fn test_error_status_is_logged_as_success_record() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let (status, _) = common::send(common::app(&log), "/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["code"], 404);
    assert_eq!(record["body"], json!(["nothing here"]));
}

#[tokio::test]
async fn test_context_is_captured_and_sanitized() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let request = Request::builder()
        .uri("/text?page=2&tag=a&tag=b")
        .header("x-request-id", "req-123")
        .header("x-binary", HeaderValue::from_bytes(&[0xfe, 0xff]).unwrap())
        .body(Body::empty())
        .unwrap();
    let response = common::app(&log).oneshot(request).await.unwrap();
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    log.shutdown().await;
    let context = only_record(&sink)["context"].clone();

    assert_eq!(context["request_method"], "GET");
    assert_eq!(context["path"], "/text");
    assert_eq!(context["query_string"], "page=2&tag=a&tag=b");
    assert_eq!(context["params"], json!({ "page": "2", "tag": ["a", "b"] }));
    assert_eq!(context["request_id"], "req-123");
    assert_eq!(context["headers"]["x-request-id"], "req-123");
    assert!(context["headers"].get("x-binary").is_none());
}

#[tokio::test]
async fn test_generated_request_id_when_header_missing() {
    let sink = MemorySink::new();
    let log = start(&sink);

    common::send(common::app(&log), "/slow").await;

    log.shutdown().await;
    let request_id = only_record(&sink)["context"]["request_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(uuid::Uuid::parse_str(&request_id).is_ok());
}

#[tokio::test]
async fn test_handler_can_enrich_context() {
    let sink = MemorySink::new();
    let log = start(&sink);

    common::send(common::app(&log), "/enriched").await;

    log.shutdown().await;
    let context = only_record(&sink)["context"].clone();
    assert_eq!(context["user_id"], 42);
    assert!(context.get("handler_state").is_none());
    assert_eq!(context["path"], "/enriched");
}

#[derive(Debug, thiserror::Error)]
#[error("query failed")]
struct QueryError(#[source] io::Error);

async fn failing(_request: Request<Body>) -> Result<Response<Body>, QueryError> {
    Err(QueryError(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset",
    )))
}

#[tokio::test]
async fn test_handler_error_is_logged_and_returned() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let service = ServiceBuilder::new()
        .layer(log.layer())
        .service(service_fn(failing));
    let result = service
        .oneshot(Request::builder().uri("/orders").body(Body::empty()).unwrap())
        .await;

    let error = result.err().expect("error must reach the caller");
    assert_eq!(error.to_string(), "query failed");

    log.shutdown().await;
    let record = only_record(&sink);
    assert!(record["class"].as_str().unwrap().ends_with("QueryError"));
    assert_eq!(record["message"], "query failed");
    assert!(record["backtrace"].is_array());
    assert_eq!(record["context"]["path"], "/orders");
    assert!(record.get("code").is_none());
    assert!(record.get("body").is_none());
}

async fn failing_boxed(_request: Request<Body>) -> Result<Response<Body>, BoxError> {
    Err(Box::new(QueryError(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset",
    ))))
}

#[tokio::test]
async fn test_boxed_handler_error_keeps_source_chain() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let service = ServiceBuilder::new()
        .layer(log.layer())
        .service(service_fn(failing_boxed));
    let error = service
        .oneshot(Request::builder().uri("/orders").body(Body::empty()).unwrap())
        .await
        .err()
        .expect("error must reach the caller");
    assert!(error.downcast_ref::<QueryError>().is_some());

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["message"], "query failed");
    assert_eq!(record["backtrace"], json!(["connection reset"]));
    assert!(record.get("code").is_none());
}

async fn enriching(_request: Request<Body>) -> Result<Response<Body>, Infallible> {
    let mut context = RequestContext::new();
    context.insert("tenant", "acme");
    let mut response = Response::new(Body::from("ok"));
    response.extensions_mut().insert(context);
    Ok(response)
}

#[tokio::test]
async fn test_response_extensions_are_left_intact() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let service = ServiceBuilder::new()
        .layer(log.layer())
        .service(service_fn(enriching));
    let response = service
        .oneshot(Request::builder().uri("/tenant").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let context = response.extensions().get::<RequestContext>().unwrap();
    assert_eq!(context.get("tenant").and_then(|v| v.as_str()), Some("acme"));
    drop(response);

    log.shutdown().await;
    assert_eq!(only_record(&sink)["context"]["tenant"], "acme");
}

/// Service that panics inside `call` instead of returning a future.
#[derive(Clone)]
struct PanicsOnCall;

impl Service<Request<Body>> for PanicsOnCall {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = std::future::Ready<Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: Request<Body>) -> Self::Future {
        panic!("refused before returning a future")
    }
}

#[tokio::test]
async fn test_panic_inside_call_is_logged_and_propagated() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let mut service = ServiceBuilder::new().layer(log.layer()).service(PanicsOnCall);
    let request = Request::builder().uri("/early").body(Body::empty()).unwrap();

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| service.call(request)));
    assert!(result.is_err());

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["class"], "panic");
    assert_eq!(record["message"], "refused before returning a future");
    assert_eq!(record["context"]["path"], "/early");
}

async fn exploding(_request: Request<Body>) -> Result<Response<Body>, Infallible> {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_handler_panic_is_logged_and_propagated() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let service = ServiceBuilder::new()
        .layer(log.layer())
        .service(service_fn(exploding));
    let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();

    let joined = tokio::spawn(service.oneshot(request)).await;
    assert!(joined.unwrap_err().is_panic());

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["class"], "panic");
    assert_eq!(record["message"], "handler exploded");
    assert_eq!(record["context"]["path"], "/boom");
}

#[tokio::test]
async fn test_dropped_body_still_logs_captured_chunks() {
    let sink = MemorySink::new();
    let log = start(&sink);

    let response = common::app(&log)
        .oneshot(Request::builder().uri("/text").body(Body::empty()).unwrap())
        .await
        .unwrap();
    drop(response);

    log.shutdown().await;
    let record = only_record(&sink);
    assert_eq!(record["code"], 200);
    assert_eq!(record["body"], json!([]));
}
