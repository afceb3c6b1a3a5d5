//! Moving a handler onto its own background thread.
//!
//! [`Buffered`] wraps one handler. Dispatching to it never runs the handler
//! on the caller's thread: the message is queued and a [`PendingResult`] is
//! returned at once. A single worker thread per wrapper drains the queue in
//! FIFO order, one job at a time.
//!
//! The wrapped handler cannot borrow the caller's context across threads, so
//! it runs against [`SharedContext::Shared`], a `Send` handle the wrapper
//! takes from the context on every dispatch. Whatever synchronization the
//! shared part needs is up to the application.
//!
//! ```rust,ignore
//! let store = Buffered::new(owned(|db: &mut Arc<Db>, row: Row| db.insert(row)))?;
//! let pending = store.submit(&db, Row::new("alice"))?;
//! pending.wait()?;
//! ```

mod pending;
mod worker;

pub use pending::{Outcome, PendingResult};

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use switchboard_core::{
    Access, AnyReply, Capability, ContextAccess, Delivery, DispatchError, DispatchResult, Handler,
    MessageType, Reply, Shape, matches,
};
use switchboard_framework::Context;
use tracing::debug;

use crate::config::OffloadConfig;
use crate::error::{OffloadError, OffloadResult};
use worker::Worker;

/// A context that can hand out a part of itself to another thread.
pub trait SharedContext {
    /// The part handed to offloaded handlers.
    type Shared: Send + 'static;

    /// Returns a handle to the shared part.
    fn share(&self) -> Self::Shared;
}

impl<T> SharedContext for Arc<T>
where
    T: Send + Sync + ?Sized + 'static,
{
    type Shared = Arc<T>;

    fn share(&self) -> Arc<T> {
        Arc::clone(self)
    }
}

impl SharedContext for () {
    type Shared = ();

    fn share(&self) {}
}

impl<S: SharedContext> SharedContext for Context<S> {
    type Shared = S::Shared;

    fn share(&self) -> S::Shared {
        self.state().share()
    }
}

/// Runs a handler on a dedicated worker thread.
///
/// As a handler, `Buffered` needs ownership of the message and always answers
/// `Reply::Hard(PendingResult)`.
///
/// A job that never runs, because the queue was full when it was submitted or
/// the wrapper was dropped while it was still queued, does not leave its
/// [`PendingResult`] unresolved forever: the handle resolves to
/// [`OffloadError::Dropped`].
pub struct Buffered<C, H> {
    handler: Arc<H>,
    worker: Worker,
    _context: PhantomData<fn(&C)>,
}

impl<C, H> Buffered<C, H>
where
    C: SharedContext,
    H: Handler<C::Shared> + 'static,
{
    /// Wraps `handler` with the default offload settings.
    pub fn new(handler: H) -> OffloadResult<Self> {
        Self::with_config(handler, &OffloadConfig::default())
    }

    /// Wraps `handler`, sizing the queue and naming the worker from `config`.
    pub fn with_config(handler: H, config: &OffloadConfig) -> OffloadResult<Self> {
        Ok(Self {
            handler: Arc::new(handler),
            worker: Worker::spawn(config)?,
            _context: PhantomData,
        })
    }

    /// Queues `message` for the wrapped handler.
    pub fn submit<M>(&self, ctx: &C, message: M) -> DispatchResult<PendingResult>
    where
        M: Any + Send,
    {
        let ty = MessageType::of::<M>();
        if !matches::<C::Shared, H>(&self.handler, ContextAccess::Exclusive, ty) {
            return Err(DispatchError::NoMatchingHandler { message: ty.name() });
        }
        Ok(self.enqueue(ctx.share(), ty, Box::new(message)))
    }

    /// Number of jobs waiting to start.
    pub fn queued(&self) -> usize {
        self.worker.queued()
    }

    fn enqueue(
        &self,
        mut shared: C::Shared,
        ty: MessageType,
        message: Box<dyn Any + Send>,
    ) -> PendingResult {
        let (tx, pending) = PendingResult::channel(ty.name());
        let handler = Arc::clone(&self.handler);

        let queued = self.worker.push(Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                handler.call(&mut shared, Delivery::from_boxed(ty, message))
            }));
            let outcome = match outcome {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(err)) => Err(OffloadError::Failed(err)),
                Err(panic) => Err(OffloadError::Panicked {
                    message: ty.name(),
                    reason: panic_reason(panic.as_ref()),
                }),
            };
            if let Err(abandoned) = tx.send(outcome) {
                debug!(
                    message = ty.name(),
                    error = abandoned.as_ref().err().map(OffloadError::as_label),
                    "Offloaded result was abandoned"
                );
            }
        }));
        if !queued {
            let dropped = OffloadError::Dropped { message: ty.name() };
            debug!(message = ty.name(), error = dropped.as_label(), "Offloaded message dropped");
        }
        pending
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        (*reason).to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<C, H> Handler<C> for Buffered<C, H>
where
    C: SharedContext,
    H: Handler<C::Shared> + 'static,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        self.handler.capability(ty).map(|_| {
            Capability::new(Access::Owned)
                .answering(Shape::Hard, Some(MessageType::of::<PendingResult>()))
        })
    }

    fn message_types(&self) -> Vec<MessageType> {
        self.handler.message_types()
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let ty = message.message_type();
        if !matches::<C::Shared, H>(&self.handler, ContextAccess::Exclusive, ty) {
            return Err(DispatchError::NoMatchingHandler { message: ty.name() });
        }
        let Some(boxed) = message.into_boxed() else {
            return Err(DispatchError::Misrouted {
                expected: ty.name(),
                found: "a shared view".to_string(),
            });
        };
        let pending = self.enqueue(ctx.share(), ty, boxed);
        Ok(Reply::Hard(Box::new(pending)))
    }
}

impl<C, H> fmt::Debug for Buffered<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffered")
            .field("queued", &self.worker.queued())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;
    use switchboard_core::{Hard, HandlerExt};
    use switchboard_framework::{First, Serial, owned, view};

    type Log = Arc<Mutex<Vec<u32>>>;

    struct Gate(Arc<Barrier>, Arc<Barrier>);

    fn gate() -> (Gate, Arc<Barrier>, Arc<Barrier>) {
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        (
            Gate(Arc::clone(&started), Arc::clone(&release)),
            started,
            release,
        )
    }

    fn recorder(capacity: usize) -> Buffered<Log, Serial<Log>> {
        let inner = Serial::builder()
            .handler(owned(|_: &mut Log, g: Gate| {
                g.0.wait();
                g.1.wait();
            }))
            .handler(owned(|log: &mut Log, n: u32| log.lock().push(n)))
            .build()
            .unwrap();
        Buffered::with_config(
            inner,
            &OffloadConfig {
                capacity,
                ..OffloadConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_bounded_queue_runs_exactly_capacity_jobs_in_order() {
        let log = Log::default();
        let buffered = recorder(3);
        let (g, started, release) = gate();
        let blocker = buffered.submit(&log, g).unwrap();
        started.wait();

        let pending: Vec<_> = (0..5_u32).map(|n| buffered.submit(&log, n).unwrap()).collect();
        release.wait();

        blocker.wait().unwrap();
        let outcomes: Vec<_> = pending.into_iter().map(PendingResult::wait).collect();
        let dropped = outcomes
            .iter()
            .filter(|o| matches!(o, Err(OffloadError::Dropped { .. })))
            .count();
        assert_eq!(dropped, 2);
        assert!(outcomes[..3].iter().all(Result::is_ok));
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failures_do_not_stop_the_worker() {
        let inner = view(|_: &mut (), n: &i32| {
            if *n < 0 {
                panic!("negative input");
            }
            if *n == 0 {
                return Err("zero input");
            }
            Ok(Hard(n * 10))
        });
        let buffered: Buffered<(), _> = Buffered::new(inner).unwrap();

        let panicked = buffered.submit(&(), -1_i32).unwrap();
        let failed = buffered.submit(&(), 0_i32).unwrap();
        let fine = buffered.submit(&(), 4_i32).unwrap();

        assert!(matches!(
            panicked.wait(),
            Err(OffloadError::Panicked { ref reason, .. }) if reason == "negative input"
        ));
        match failed.wait() {
            Err(OffloadError::Failed(err)) => assert_eq!(err.to_string(), "zero input"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fine.wait_for::<i32>().unwrap(), Reply::Hard(40));
    }

    #[test]
    fn test_dispatch_through_a_router_returns_the_handle() {
        let log = Log::default();
        let router = First::builder()
            .handler(view(|log: &mut Log, n: &u32| log.lock().push(n + 100)))
            .handler(recorder(0))
            .build()
            .unwrap();

        let mut ctx = Arc::clone(&log);
        let reply = router
            .dispatch_request::<_, PendingResult>(&mut ctx, 7_u32)
            .unwrap();
        let Reply::Hard(pending) = reply else {
            panic!("offloading always answers");
        };
        tokio_test::block_on(pending).unwrap();
        assert_eq!(*log.lock(), vec![107, 7]);
    }

    #[test]
    fn test_views_cannot_be_offloaded() {
        let buffered = recorder(0);
        let mut log = Log::default();
        let err = buffered.dispatch_view(&mut log, &1_u32).unwrap_err();
        assert!(matches!(err, DispatchError::Misrouted { .. }));

        let cap = buffered.capability(MessageType::of::<u32>()).unwrap();
        assert_eq!(cap.access, Access::Owned);
        assert_eq!(cap.shape, Shape::Hard);
        assert!(buffered.capability(MessageType::of::<String>()).is_none());
        assert!(matches!(
            buffered.submit(&log, String::from("text")),
            Err(DispatchError::NoMatchingHandler { .. })
        ));
    }

    #[test]
    fn test_shutdown_waits_for_the_running_job() {
        let log = Log::default();
        let buffered = recorder(0);
        let (g, started, release) = gate();
        let _blocker = buffered.submit(&log, g).unwrap();
        let queued = buffered.submit(&log, 1_u32).unwrap();
        started.wait();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            release.wait();
        });
        drop(buffered);
        releaser.join().unwrap();

        assert!(matches!(queued.wait(), Err(OffloadError::Dropped { .. })));
        assert!(log.lock().is_empty());
    }
}
