//! Single-writer command queue in front of a [`TableLink`].
//!
//! [`spawn_worker`] moves the link onto a dedicated thread.  Producers hold a
//! cloneable [`ValveHandle`] and submit commands over a bounded channel; each
//! command is answered through a oneshot channel once the frame has been
//! written (or has failed).
//!
//! Transport writes block with no timeout, so they never run on a runtime
//! worker; async callers only await the replies.
//!
//! # Failure
//!
//! An address error is reported to the caller and the worker carries on.  A
//! transport error closes the link and stops the worker; every later command
//! fails with [`WorkerError::Stopped`].  Reconnecting is left to the host.

use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use valve_core::{Coordinate, LinkError, LinkState, TableLink, Transport};

/// Error type for commands submitted through a [`ValveHandle`].
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread has exited; the command was not applied.
    #[error("valve worker has stopped")]
    Stopped,

    /// The link rejected or failed the command.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The worker thread could not be started.
    #[error("failed to spawn valve worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// One operation on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValveOp {
    Set { coordinate: Coordinate, open: bool },
    SetMany { coordinates: Vec<Coordinate>, open: bool },
    SetBoard { index: usize, open: bool },
    Fill,
    Clear,
    Resend,
    /// Close the link and stop the worker.
    Shutdown,
}

struct Request {
    op: ValveOp,
    reply: oneshot::Sender<Result<(), LinkError>>,
}

/// Cloneable producer side of the valve worker.
#[derive(Debug, Clone)]
pub struct ValveHandle {
    tx: mpsc::Sender<Request>,
}

impl ValveHandle {
    /// Opens (`true`) or closes (`false`) one valve.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Link`] with the link's error, or
    /// [`WorkerError::Stopped`] if the worker is gone.
    pub async fn set(&self, coordinate: Coordinate, open: bool) -> Result<(), WorkerError> {
        self.submit(ValveOp::Set { coordinate, open }).await
    }

    /// Sets several valves in order with one frame.  Not transactional.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn set_many(
        &self,
        coordinates: Vec<Coordinate>,
        open: bool,
    ) -> Result<(), WorkerError> {
        self.submit(ValveOp::SetMany { coordinates, open }).await
    }

    /// Opens or closes every valve on one board.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn set_board(&self, index: usize, open: bool) -> Result<(), WorkerError> {
        self.submit(ValveOp::SetBoard { index, open }).await
    }

    /// Opens every valve.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn fill(&self) -> Result<(), WorkerError> {
        self.submit(ValveOp::Fill).await
    }

    /// Closes every valve.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn clear(&self) -> Result<(), WorkerError> {
        self.submit(ValveOp::Clear).await
    }

    /// Re-sends the current state, e.g. after a suspected dropped frame.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn resend(&self) -> Result<(), WorkerError> {
        self.submit(ValveOp::Resend).await
    }

    /// Closes the link and stops the worker.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Stopped`] if it had already stopped.
    pub async fn shutdown(&self) -> Result<(), WorkerError> {
        self.submit(ValveOp::Shutdown).await
    }

    /// Returns `true` once the worker has exited.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }

    /// Submits `op` and waits for the worker's answer.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub async fn submit(&self, op: ValveOp) -> Result<(), WorkerError> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Request { op, reply })
            .await
            .map_err(|_| WorkerError::Stopped)?;
        answer.await.map_err(|_| WorkerError::Stopped)??;
        Ok(())
    }
}

/// Moves `link` onto a dedicated thread and returns the producer handle.
///
/// The join handle yields the link back once the worker stops, so callers
/// can inspect its final state.
///
/// # Errors
///
/// Returns [`WorkerError::Spawn`] if the thread cannot be created.
pub fn spawn_worker<T>(
    link: TableLink<T>,
    queue_depth: usize,
) -> Result<(ValveHandle, JoinHandle<TableLink<T>>), WorkerError>
where
    T: Transport + Send + 'static,
{
    let (tx, rx) = mpsc::channel(queue_depth.max(1));

    let join = std::thread::Builder::new()
        .name("valve-worker".to_string())
        .spawn(move || worker_loop(link, rx))
        .map_err(WorkerError::Spawn)?;

    info!(queue_depth, "valve worker started");
    Ok((ValveHandle { tx }, join))
}

/// The receive loop executed on the worker thread.
fn worker_loop<T: Transport>(
    mut link: TableLink<T>,
    mut rx: mpsc::Receiver<Request>,
) -> TableLink<T> {
    while let Some(Request { op, reply }) = rx.blocking_recv() {
        debug!(?op, "valve command");
        let shutdown = op == ValveOp::Shutdown;
        let result = apply(&mut link, op);

        match &result {
            Ok(()) => {}
            Err(e @ LinkError::Address(_)) => warn!("valve command rejected: {e}"),
            Err(e) => error!("valve command failed: {e}"),
        }
        // The producer may have stopped waiting.
        let _ = reply.send(result);

        if shutdown || link.state() == LinkState::Closed {
            break;
        }
    }

    if link.state() == LinkState::Ready {
        if let Err(e) = link.close() {
            error!("failed to close link: {e}");
        }
    }
    info!(frames_sent = link.frames_sent(), "valve worker stopped");
    link
}

fn apply<T: Transport>(link: &mut TableLink<T>, op: ValveOp) -> Result<(), LinkError> {
    match op {
        ValveOp::Set { coordinate, open } => link.set(coordinate, open),
        ValveOp::SetMany { coordinates, open } => link.set_many(coordinates, open),
        ValveOp::SetBoard { index, open } => link.set_board(index, open),
        ValveOp::Fill => link.fill(),
        ValveOp::Clear => link.clear(),
        ValveOp::Resend => link.send(),
        ValveOp::Shutdown => link.close(),
    }
}
