//! Exhaustiveness guard.
//!
//! [`MustHandle`] wraps a router and turns "no handler accepts this message"
//! from a silent no-op, or a plain lookup miss, into a logged
//! [`DispatchError::Unhandled`]. The guard itself claims every message type,
//! so it can sit inside another router without hiding anything.

use switchboard_core::{
    AnyReply, Capability, ContextAccess, Delivery, DispatchError, DispatchResult, Handler,
    MessageType, matches,
};
use tracing::error;

/// Wraps a handler and reports every message it does not accept.
#[derive(Debug, Clone)]
pub struct MustHandle<H> {
    inner: H,
}

impl<H> MustHandle<H> {
    /// Guards `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Returns the guarded handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<C, H> Handler<C> for MustHandle<H>
where
    H: Handler<C>,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        Some(self.inner.capability(ty).unwrap_or_else(Capability::view))
    }

    fn message_types(&self) -> Vec<MessageType> {
        self.inner.message_types()
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let ty = message.message_type();
        if !matches::<C, H>(&self.inner, ContextAccess::Exclusive, ty) {
            let err = DispatchError::Unhandled { message: ty.name() };
            error!(
                message = ty.name(),
                error = err.as_label(),
                "Message must be handled but nothing accepts it"
            );
            return Err(err);
        }
        self.inner.call(ctx, message)
    }
}
