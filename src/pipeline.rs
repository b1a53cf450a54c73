//! Pipeline wiring.
//!
//! # Data Flow
//! ```text
//! AccessLogConfig + sink + reporter + preprocessor
//!     → AccessLogBuilder::build (validate, start dispatcher)
//!     → AccessLog (cheap to clone, shared by every middleware instance)
//!         → log(): submit one task per request
//!             → RecordBuilder::build → deliver → LogSink
//! ```
//!
//! # Design Decisions
//! - Built once at startup; nothing about it changes per request
//! - Queued tasks hold the delivery half only, never the dispatcher itself

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::ContextValue;
use crate::config::{validate_config, AccessLogConfig, ConfigError};
use crate::dispatch::{BoxError, Dispatcher, LogError, Reporter, TracingReporter};
use crate::http::AccessLogLayer;
use crate::observability::metrics;
use crate::record::builder::{identity, Preprocessor};
use crate::record::{deliver, LogRecord, Outcome, RecordBuilder, Route};
use crate::sink::{HttpSink, LogSink};

/// Everything a queued task needs to turn captured data into a delivered record.
struct Delivery {
    builder: RecordBuilder,
    sink: Arc<dyn LogSink>,
    route: Route,
}

impl Delivery {
    async fn run(
        &self,
        context: ContextValue,
        outcome: Outcome,
        response_time: Duration,
    ) -> Result<(), LogError> {
        let record = self.builder.build(&context, &outcome, response_time)?;

        let started = Instant::now();
        deliver(&record, self.sink.as_ref(), &self.route).await?;
        metrics::record_delivered(started.elapsed());

        tracing::trace!(
            stream_name = %self.route.stream_name,
            success = outcome.is_success(),
            "Access log record delivered"
        );
        Ok(())
    }
}

struct Inner {
    delivery: Arc<Delivery>,
    dispatcher: Dispatcher,
}

/// Handle to a running access log pipeline.
#[derive(Clone)]
pub struct AccessLog {
    inner: Arc<Inner>,
}

impl AccessLog {
    pub fn builder(config: AccessLogConfig) -> AccessLogBuilder {
        AccessLogBuilder::new(config)
    }

    /// Middleware that logs every request through this pipeline.
    pub fn layer(&self) -> AccessLogLayer {
        AccessLogLayer::new(self.clone())
    }

    /// Queue one record. Returns immediately; all work happens on the worker.
    pub fn log(&self, context: ContextValue, outcome: Outcome, response_time: Duration) {
        let delivery = self.inner.delivery.clone();
        self.inner
            .dispatcher
            .submit(async move { delivery.run(context, outcome, response_time).await });
    }

    pub fn max_non_json_body_chunks(&self) -> usize {
        self.inner.delivery.builder.max_non_json_body_chunks()
    }

    pub fn route(&self) -> &Route {
        &self.inner.delivery.route
    }

    /// Records queued or in flight.
    pub fn pending(&self) -> usize {
        self.inner.dispatcher.pending()
    }

    /// Flush every queued record and stop the worker.
    ///
    /// Records logged afterwards are dropped and reported.
    pub async fn shutdown(&self) {
        tracing::info!(pending = self.pending(), "Flushing access log queue");
        self.inner.dispatcher.shutdown().await;
    }
}

impl std::fmt::Debug for AccessLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLog")
            .field("route", self.route())
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Assembles an [`AccessLog`] from configuration and collaborators.
pub struct AccessLogBuilder {
    config: AccessLogConfig,
    sink: Option<Arc<dyn LogSink>>,
    reporter: Arc<dyn Reporter>,
    preprocessor: Preprocessor,
}

impl AccessLogBuilder {
    pub fn new(config: AccessLogConfig) -> Self {
        Self {
            config,
            sink: None,
            reporter: Arc::new(TracingReporter),
            preprocessor: identity(),
        }
    }

    /// Use `sink` instead of building an [`HttpSink`] from `config.sink`.
    pub fn sink(self, sink: impl LogSink + 'static) -> Self {
        self.shared_sink(Arc::new(sink))
    }

    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Hook run on every record before delivery.
    pub fn preprocessor<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(LogRecord) -> Result<LogRecord, BoxError> + Send + Sync + 'static,
    {
        self.preprocessor = Arc::new(preprocessor);
        self
    }

    /// Validate the configuration and start the worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<AccessLog, ConfigError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => Arc::new(HttpSink::from_config(&self.config.sink)?) as Arc<dyn LogSink>,
        };

        let delivery = Arc::new(Delivery {
            builder: RecordBuilder::new(self.config.max_non_json_body_chunks)
                .with_shared_preprocessor(self.preprocessor),
            sink,
            route: Route {
                stream_name: self.config.stream_name.clone(),
                partition_key: self.config.partition_key.clone(),
            },
        });
        let dispatcher = Dispatcher::start(self.reporter, self.config.queue_capacity);

        tracing::info!(
            stream_name = %self.config.stream_name,
            partition_key = %self.config.partition_key,
            max_non_json_body_chunks = self.config.max_non_json_body_chunks,
            queue_capacity = ?self.config.queue_capacity,
            "Access log pipeline started"
        );

        Ok(AccessLog {
            inner: Arc::new(Inner {
                delivery,
                dispatcher,
            }),
        })
    }
}
