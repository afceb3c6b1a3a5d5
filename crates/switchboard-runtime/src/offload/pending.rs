//! The handle returned for every offloaded message.

use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use switchboard_core::{AnyReply, DispatchError, Reply};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{OffloadError, OffloadResult};

/// What an offloaded message finally resolves to.
pub type Outcome = OffloadResult<AnyReply>;

/// The eventual outcome of one offloaded message.
///
/// Resolves to the wrapped handler's reply, or to the error it raised. A job
/// that never ran resolves to [`OffloadError::Dropped`].
///
/// Await it from async code or call [`wait`](Self::wait) from a plain thread.
#[must_use = "the outcome of an offloaded message is only visible through its PendingResult"]
pub struct PendingResult {
    message: &'static str,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResult {
    pub(crate) fn channel(message: &'static str) -> (oneshot::Sender<Outcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { message, rx })
    }

    /// The type name of the offloaded message.
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Blocks the current thread until the job has finished.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context; await
    /// the handle there instead.
    pub fn wait(self) -> Outcome {
        let message = self.message;
        self.rx
            .blocking_recv()
            .unwrap_or(Err(OffloadError::Dropped { message }))
    }

    /// Blocks until the job has finished and recovers a typed reply.
    pub fn wait_for<T: Any>(self) -> OffloadResult<Reply<T>> {
        let message = self.message;
        self.wait()?.downcast::<T>().map_err(|_| {
            OffloadError::Failed(DispatchError::ReplyType {
                message,
                expected: type_name::<T>(),
            })
        })
    }

    /// Takes the outcome if the job has already finished.
    pub fn try_take(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(OffloadError::Dropped {
                message: self.message,
            })),
        }
    }
}

impl Future for PendingResult {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        let message = self.message;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(OffloadError::Dropped { message })))
    }
}

impl fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandoned_sender_reports_dropped() {
        let (tx, pending) = PendingResult::channel("demo::Job");
        drop(tx);
        assert!(matches!(
            pending.wait(),
            Err(OffloadError::Dropped { message: "demo::Job" })
        ));
    }

    #[test]
    fn test_try_take_before_and_after() {
        let (tx, mut pending) = PendingResult::channel("demo::Job");
        assert!(pending.try_take().is_none());
        tx.send(Ok(Reply::Hard(5_u8).boxed())).unwrap();
        let reply = pending.try_take().unwrap().unwrap();
        assert_eq!(reply.downcast::<u8>().unwrap(), Reply::Hard(5));
    }

    #[test]
    fn test_await_resolves() {
        let (tx, pending) = PendingResult::channel("demo::Job");
        tx.send(Ok(Reply::Soft(Some("done")).boxed())).unwrap();
        let reply = tokio_test::block_on(pending).unwrap();
        assert_eq!(reply.downcast::<&str>().unwrap(), Reply::Soft(Some("done")));
    }

    #[test]
    fn test_wait_for_checks_the_reply_type() {
        let (tx, pending) = PendingResult::channel("demo::Job");
        tx.send(Ok(Reply::Hard(1_i64).boxed())).unwrap();
        assert!(matches!(
            pending.wait_for::<String>(),
            Err(OffloadError::Failed(DispatchError::ReplyType { .. }))
        ));
    }
}
