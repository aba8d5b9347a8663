//! # Session Plumbing
//!
//! The queue between producers and the task that owns a display, and the
//! handle used to join that task exactly once.

use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use progress_telemetry::BATCHES_WRITTEN;
use progress_types::{SolveStatus, VertexWarning};

use crate::errors::ProgressError;

/// Unit of work for a session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Ingest this batch, then redraw.
    Status(SolveStatus),
    /// The build finished.
    Finish,
}

/// Create the producer and consumer ends of a session queue.
///
/// The queue is unbounded so that `write` never waits on the display.
pub fn session_channel() -> (SessionSender, SessionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionSender { tx }, SessionReceiver { rx })
}

/// Producer end. Cheap to clone; safe to use from any thread.
#[derive(Debug, Clone)]
pub struct SessionSender {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionSender {
    /// Enqueue a batch. Returns false if the session already ended.
    pub fn send_status(&self, status: SolveStatus) -> bool {
        BATCHES_WRITTEN.inc();
        match self.tx.send(SessionCommand::Status(status)) {
            Ok(()) => true,
            Err(_) => {
                debug!("Status batch dropped (session ended)");
                false
            }
        }
    }

    /// Enqueue the completion signal.
    pub fn finish(&self) -> bool {
        self.tx.send(SessionCommand::Finish).is_ok()
    }

    /// True once the consuming task has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end, owned by the session task.
#[derive(Debug)]
pub struct SessionReceiver {
    rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionReceiver {
    /// Wait for the next command. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<SessionCommand> {
        self.rx.recv().await
    }

    /// Take the next queued command without waiting.
    pub fn try_recv(&mut self) -> Option<SessionCommand> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next command, then take everything else already queued.
    pub async fn recv_burst(&mut self) -> Option<Vec<SessionCommand>> {
        let first = self.rx.recv().await?;
        let mut burst = vec![first];
        while let Some(next) = self.try_recv() {
            burst.push(next);
        }
        Some(burst)
    }
}

/// Run blocking output work on tokio's blocking pool.
pub(crate) async fn run_blocking<F, T>(work: F) -> Result<T, ProgressError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(join_error)
}

/// Warnings mirrored out of the session task for `warnings()` callers.
///
/// Only the session task appends; readers get a copy.
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    inner: Arc<RwLock<Vec<VertexWarning>>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append whatever `all` holds beyond what was already mirrored.
    ///
    /// `all` is the session's full, append-only warning list.
    pub fn sync(&self, all: &[VertexWarning]) {
        let mut mirrored = self.inner.write();
        if all.len() > mirrored.len() {
            let start = mirrored.len();
            mirrored.extend_from_slice(&all[start..]);
        }
    }

    pub fn snapshot(&self) -> Vec<VertexWarning> {
        self.inner.read().clone()
    }
}

type SessionTask = JoinHandle<Result<(), ProgressError>>;

/// Owner-side handle of a running session task.
pub struct SessionHandle {
    id: Uuid,
    sender: SessionSender,
    warnings: WarningLog,
    task: Mutex<Option<SessionTask>>,
}

impl SessionHandle {
    /// Spawn `task` on the current tokio runtime as the session owner.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(sender: SessionSender, warnings: WarningLog, kind: &'static str, task: F) -> Self
    where
        F: Future<Output = Result<(), ProgressError>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("progress_session", session = %id, kind);
        debug!(session = %id, kind, "Progress session started");
        let handle = tokio::spawn(task.instrument(span));

        Self {
            id,
            sender,
            warnings,
            task: Mutex::new(Some(handle)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn write(&self, status: SolveStatus) {
        self.sender.send_status(status);
    }

    pub fn finish(&self) {
        self.sender.finish();
    }

    pub fn warnings(&self) -> Vec<VertexWarning> {
        self.warnings.snapshot()
    }

    /// True once the session task stopped taking batches.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Signal completion and join the session task.
    pub async fn wait(&self) -> Result<(), ProgressError> {
        let task = self.task.lock().take().ok_or(ProgressError::AlreadyWaited)?;
        self.sender.finish();

        let result = task.await.map_err(join_error)?;
        match &result {
            Ok(()) => debug!(session = %self.id, "Progress session ended"),
            Err(e) => warn!(session = %self.id, error = %e, "Progress session ended with error"),
        }
        result
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            debug!(session = %self.id, "Progress session dropped without wait");
            task.abort();
        }
    }
}

fn join_error(err: JoinError) -> ProgressError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ProgressError::LoopPanicked(message)
    } else {
        ProgressError::LoopCancelled
    }
}
