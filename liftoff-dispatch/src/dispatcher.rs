use liftoff_core::{HarnessError, Operand, OperandSource};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(Result<Operand, HarnessError>) -> JobFuture + Send>;
type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Whether the queue waits for an entry before starting the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Wait,
    NoWait,
}

struct Entry {
    job: Job,
    slot: Slot,
}

/// FIFO of commands applied to one shared operand.
///
/// Submitting must happen inside a tokio runtime: the first submission
/// spawns the worker task.
pub struct CommandDispatcher {
    source: Arc<dyn OperandSource>,
    tx: mpsc::UnboundedSender<Entry>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Entry>>>,
    stopped: Arc<AtomicBool>,
}

impl CommandDispatcher {
    /// Create a dispatcher. The operand is not requested until the first
    /// command is submitted.
    pub fn new(source: Arc<dyn OperandSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            tx,
            rx: Mutex::new(Some(rx)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue `action` and get a handle to its result.
    ///
    /// Dropping the [`Pending`] does not cancel the command.
    pub fn queue<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Slot::Wait, action, move |result| {
            let _ = tx.send(result);
        });
        Pending { rx }
    }

    /// Queue `action` without a result handle. Failures are logged.
    pub fn execute<F, Fut>(&self, action: F)
    where
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HarnessError>> + Send + 'static,
    {
        self.submit(Slot::Wait, action, |result| {
            if let Err(e) = result {
                tracing::warn!(error = %e, "liftoff.dispatch.detached_failed");
            }
        });
    }

    /// Queue `action` in order, but let the next command start as soon as
    /// this one has started.
    pub fn no_wait<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Slot::NoWait, action, move |result| {
            let _ = tx.send(result);
        });
        Pending { rx }
    }

    /// Queue `action` as the last command. Once it completes, whatever the
    /// outcome, every later command fails with [`HarnessError::Stopped`].
    pub fn queue_terminal<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        let stopped = Arc::clone(&self.stopped);
        let (tx, rx) = oneshot::channel();
        self.submit(Slot::Wait, action, move |result| {
            stopped.store(true, Ordering::SeqCst);
            let _ = tx.send(result);
        });
        Pending { rx }
    }

    /// Whether a terminal command has completed.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn submit<T, F, Fut, C>(&self, slot: Slot, action: F, on_complete: C)
    where
        T: Send + 'static,
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
        C: FnOnce(Result<T, HarnessError>) + Send + 'static,
    {
        let job: Job = Box::new(move |operand: Result<Operand, HarnessError>| -> JobFuture {
            Box::pin(async move {
                let result = match operand {
                    Ok(operand) => action(operand).await,
                    Err(e) => Err(e),
                };
                on_complete(result);
            })
        });
        self.ensure_worker();
        if let Err(mpsc::error::SendError(entry)) = self.tx.send(Entry { job, slot }) {
            // Only reachable if the worker task died; fail the command in place.
            tokio::spawn((entry.job)(Err(HarnessError::QueueClosed(
                "dispatcher worker is gone".into(),
            ))));
        }
    }

    fn ensure_worker(&self) {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(rx) = rx {
            tracing::debug!("liftoff.dispatch.worker_started");
            tokio::spawn(drain(
                rx,
                Arc::clone(&self.source),
                Arc::clone(&self.stopped),
            ));
        }
    }
}

async fn drain(
    mut rx: mpsc::UnboundedReceiver<Entry>,
    source: Arc<dyn OperandSource>,
    stopped: Arc<AtomicBool>,
) {
    while let Some(Entry { job, slot }) = rx.recv().await {
        let operand = if stopped.load(Ordering::SeqCst) {
            Err(HarnessError::Stopped)
        } else {
            source.operand().await
        };
        match slot {
            Slot::Wait => job(operand).await,
            Slot::NoWait => {
                tokio::spawn(job(operand));
            }
        }
    }
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// The eventual result of a queued command.
#[must_use = "dropping a Pending discards the result but the command still runs"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, HarnessError>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T, HarnessError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(HarnessError::QueueClosed(
                    "command dropped before completion".into(),
                ))
            })
        })
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}
