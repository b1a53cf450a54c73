//! Single-worker task queue.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::dispatch::error::{panic_message, LogError};
use crate::dispatch::reporter::Reporter;
use crate::observability::metrics;

/// A unit of logging work. Nothing runs until the worker polls it.
pub type LogTask = Pin<Box<dyn Future<Output = Result<(), LogError>> + Send>>;

enum TaskSender {
    Bounded(mpsc::Sender<LogTask>, usize),
    Unbounded(mpsc::UnboundedSender<LogTask>),
}

enum TaskReceiver {
    Bounded(mpsc::Receiver<LogTask>),
    Unbounded(mpsc::UnboundedReceiver<LogTask>),
}

impl TaskReceiver {
    async fn recv(&mut self) -> Option<LogTask> {
        match self {
            TaskReceiver::Bounded(rx) => rx.recv().await,
            TaskReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn close(&mut self) {
        match self {
            TaskReceiver::Bounded(rx) => rx.close(),
            TaskReceiver::Unbounded(rx) => rx.close(),
        }
    }
}

/// Runs logging tasks one at a time, in submission order, off the request path.
///
/// Must be started from within a Tokio runtime.
pub struct Dispatcher {
    sender: TaskSender,
    reporter: Arc<dyn Reporter>,
    pending: Arc<AtomicUsize>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    worker: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the worker. `capacity` bounds the queue; `None` leaves it unbounded.
    pub fn start(reporter: Arc<dyn Reporter>, capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity.max(1));
                (
                    TaskSender::Bounded(tx, capacity.max(1)),
                    TaskReceiver::Bounded(rx),
                )
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (TaskSender::Unbounded(tx), TaskReceiver::Unbounded(rx))
            }
        };

        let pending = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker = tokio::spawn(run_worker(
            receiver,
            shutdown_rx,
            reporter.clone(),
            pending.clone(),
        ));

        tracing::debug!(capacity = ?capacity, "Access log worker started");

        Self {
            sender,
            reporter,
            pending,
            shutdown: Mutex::new(Some(shutdown_tx)),
            worker: AsyncMutex::new(Some(worker)),
        }
    }

    /// Enqueue `task` and return immediately.
    ///
    /// If the queue refuses the task (full or closed) the task is dropped and
    /// the error goes to the reporter.
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = Result<(), LogError>> + Send + 'static,
    {
        let task: LogTask = Box::pin(task);

        self.pending.fetch_add(1, Ordering::SeqCst);
        let result = match &self.sender {
            TaskSender::Bounded(tx, capacity) => tx.try_send(task).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => LogError::QueueFull(*capacity),
                mpsc::error::TrySendError::Closed(_) => LogError::WorkerStopped,
            }),
            TaskSender::Unbounded(tx) => tx.send(task).map_err(|_| LogError::WorkerStopped),
        };

        match result {
            Ok(()) => {
                metrics::record_submitted();
                metrics::record_queue_depth(self.pending());
            }
            Err(error) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                report(self.reporter.as_ref(), &error);
            }
        }
    }

    /// Number of tasks queued or running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting tasks, drain the queue and wait for the worker to exit.
    ///
    /// Safe to call more than once, including concurrently: every caller
    /// returns only after the drain has finished.
    pub async fn shutdown(&self) {
        let signal = self.shutdown.lock().expect("dispatcher mutex poisoned").take();
        if let Some(signal) = signal {
            let _ = signal.send(());
        }

        // held across the join so concurrent callers wait for the first one
        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Access log worker terminated abnormally");
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

async fn run_worker(
    mut receiver: TaskReceiver,
    mut shutdown: oneshot::Receiver<()>,
    reporter: Arc<dyn Reporter>,
    pending: Arc<AtomicUsize>,
) {
    loop {
        tokio::select! {
            biased;
            task = receiver.recv() => match task {
                Some(task) => execute(task, reporter.as_ref(), &pending).await,
                None => break,
            },
            _ = &mut shutdown => {
                receiver.close();
                let mut drained = 0usize;
                while let Some(task) = receiver.recv().await {
                    execute(task, reporter.as_ref(), &pending).await;
                    drained += 1;
                }
                tracing::debug!(drained, "Access log queue drained");
                break;
            }
        }
    }

    tracing::debug!("Access log worker stopped");
}

async fn execute(task: LogTask, reporter: &dyn Reporter, pending: &AtomicUsize) {
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => report(reporter, &error),
        Err(panic) => report(reporter, &LogError::Panicked(panic_message(panic.as_ref()))),
    }
    pending.fetch_sub(1, Ordering::SeqCst);
    metrics::record_queue_depth(pending.load(Ordering::SeqCst));
}

fn report(reporter: &dyn Reporter, error: &LogError) {
    metrics::record_failed(error.kind());
    reporter.capture(error);
}
