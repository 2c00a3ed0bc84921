//! Completion handle returned by `admit` and `release`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use super::error::AllocatorError;

/// Outcome of a queued request, resolved by the gate worker.
///
/// Await it from async code, call [`Pending::blocking_wait`] from a plain
/// thread, or poll it with [`Pending::try_result`]. A request whose worker
/// drops it without answering resolves to [`AllocatorError::Closed`].
#[derive(Debug)]
#[must_use = "the request runs regardless, but its outcome is only visible through the handle"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, AllocatorError>>,
}

/// Worker side of a [`Pending`].
pub(crate) type Reply<T> = oneshot::Sender<Result<T, AllocatorError>>;

impl<T> Pending<T> {
    pub(crate) fn channel() -> (Reply<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Block the current thread until the request completes.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context, like
    /// tokio's own blocking receive.
    ///
    /// # Errors
    ///
    /// The request's error, or `Closed` if it was dropped unanswered.
    pub fn blocking_wait(self) -> Result<T, AllocatorError> {
        self.rx.blocking_recv().unwrap_or(Err(AllocatorError::Closed))
    }

    /// Take the result if the worker has already answered.
    ///
    /// Returns `None` while the request is still queued or running. Once a
    /// result has been taken, later calls report `Closed`.
    pub fn try_result(&mut self) -> Option<Result<T, AllocatorError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(AllocatorError::Closed)),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, AllocatorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(AllocatorError::Closed)))
    }
}
