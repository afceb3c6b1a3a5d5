//! The handler trait every router, guard and wrapper implements.
//!
//! A [`Handler`] is erased over the message type: it reports its
//! [`Capability`] for a [`MessageType`] and is called with a [`Delivery`].
//! Because routers are handlers too, routers nest inside routers.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::capability::Capability;
use crate::error::{DispatchError, DispatchResult};
use crate::message::{Delivery, MessageType};
use crate::reply::{AnyReply, Reply};

/// Something that can process some message types against a context `C`.
pub trait Handler<C>: Send + Sync {
    /// Returns the capability for messages of type `ty`, or `None` if this
    /// handler does not accept them.
    fn capability(&self, ty: MessageType) -> Option<Capability>;

    /// The message types this handler names explicitly.
    ///
    /// Routers check every listed type when they are assembled. Catch-all
    /// handlers list nothing.
    fn message_types(&self) -> Vec<MessageType> {
        Vec::new()
    }

    /// Handles one message.
    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply>;
}

/// A type-erased handler.
pub type BoxedHandler<C> = Box<dyn Handler<C>>;

impl<C, H> Handler<C> for Box<H>
where
    H: Handler<C> + ?Sized,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        (**self).capability(ty)
    }

    fn message_types(&self) -> Vec<MessageType> {
        (**self).message_types()
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        (**self).call(ctx, message)
    }
}

impl<C, H> Handler<C> for Arc<H>
where
    H: Handler<C> + ?Sized,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        (**self).capability(ty)
    }

    fn message_types(&self) -> Vec<MessageType> {
        (**self).message_types()
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        (**self).call(ctx, message)
    }
}

/// Typed entry points on top of [`Handler::call`].
pub trait HandlerExt<C>: Handler<C> {
    /// Dispatches `message` by value.
    fn dispatch<M>(&self, ctx: &mut C, message: M) -> DispatchResult<AnyReply>
    where
        M: Any + Send,
    {
        self.call(ctx, Delivery::owned(message))
    }

    /// Dispatches a borrowed `message`; no handler receives ownership.
    fn dispatch_view<M>(&self, ctx: &mut C, message: &M) -> DispatchResult<AnyReply>
    where
        M: Any + Send,
    {
        self.call(ctx, Delivery::view(message))
    }

    /// Dispatches an event, discarding any answer.
    fn dispatch_event<M>(&self, ctx: &mut C, event: M) -> DispatchResult<()>
    where
        M: Any + Send,
    {
        self.dispatch(ctx, event).map(drop)
    }

    /// Dispatches a request and recovers a typed answer.
    fn dispatch_request<M, T>(&self, ctx: &mut C, request: M) -> DispatchResult<Reply<T>>
    where
        M: Any + Send,
        T: Any,
    {
        self.dispatch(ctx, request)?
            .downcast::<T>()
            .map_err(|_| DispatchError::ReplyType {
                message: type_name::<M>(),
                expected: type_name::<T>(),
            })
    }
}

impl<C, H> HandlerExt<C> for H where H: Handler<C> + ?Sized {}
