use std::fmt;
use std::marker::PhantomData;

use switchboard_core::{
    AnyReply, Capability, Delivery, DispatchResult, Handler, IntoReply, MessageRef, MessageType,
};

use super::finish;

/// A handler that accepts every message type through a read-only view.
pub struct AnyHandler<C, R, F> {
    f: F,
    _marker: PhantomData<fn(&mut C) -> R>,
}

/// Builds a catch-all handler.
///
/// ```rust,ignore
/// let log = any(|_: &mut State, message: MessageRef<'_>| {
///     tracing::info!(message = message.type_name(), "dispatching");
/// });
/// ```
pub fn any<C, R, F>(f: F) -> AnyHandler<C, R, F>
where
    R: IntoReply,
    F: Fn(&mut C, MessageRef<'_>) -> R + Send + Sync,
{
    AnyHandler {
        f,
        _marker: PhantomData,
    }
}

impl<C, R, F> fmt::Debug for AnyHandler<C, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyHandler").finish_non_exhaustive()
    }
}

impl<C, R, F> Handler<C> for AnyHandler<C, R, F>
where
    R: IntoReply,
    F: Fn(&mut C, MessageRef<'_>) -> R + Send + Sync,
{
    fn capability(&self, _ty: MessageType) -> Option<Capability> {
        Some(Capability::view().answering(R::SHAPE, R::reply_type()))
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        finish((self.f)(ctx, message.peek()))
    }
}
