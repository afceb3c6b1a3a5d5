use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use switchboard_core::{
    Access, AnyReply, Capability, Delivery, DispatchResult, Handler, IntoReply, MessageType,
};

use super::{finish, refused};

/// Access marker: the closure borrows the message.
#[derive(Debug, Clone, Copy)]
pub struct ByRef;

/// Access marker: the closure takes the message by value.
#[derive(Debug, Clone, Copy)]
pub struct ByValue;

/// Access marker: the closure takes a clone when only a view is on offer.
#[derive(Debug, Clone, Copy)]
pub struct ByClone;

/// Access marker: the closure mutates the message in place.
#[derive(Debug, Clone, Copy)]
pub struct ByMut;

/// A handler for exactly one message type `M`, backed by a closure.
///
/// `A` is one of the access markers and picks how the closure receives the
/// message. Build one with [`view`], [`owned`], [`cloned`] or [`mutable`].
pub struct FnHandler<C, M, R, A, F> {
    f: F,
    _marker: PhantomData<fn(&mut C, M, A) -> R>,
}

impl<C, M, R, A, F> FnHandler<C, M, R, A, F> {
    fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<C, M, R, A, F> fmt::Debug for FnHandler<C, M, R, A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("message", &std::any::type_name::<M>())
            .field("access", &std::any::type_name::<A>())
            .finish()
    }
}

fn capability_for<M: Any, R: IntoReply>(ty: MessageType, access: Access) -> Option<Capability> {
    ty.is::<M>()
        .then(|| Capability::new(access).answering(R::SHAPE, R::reply_type()))
}

/// Handles `M` through a shared reference.
pub fn view<C, M, R, F>(f: F) -> FnHandler<C, M, R, ByRef, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, &M) -> R + Send + Sync,
{
    FnHandler::new(f)
}

/// Handles `M` by value. Such a handler can only be the last match.
pub fn owned<C, M, R, F>(f: F) -> FnHandler<C, M, R, ByValue, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, M) -> R + Send + Sync,
{
    FnHandler::new(f)
}

/// Handles `M` by value, cloning it when the delivery is a view.
pub fn cloned<C, M, R, F>(f: F) -> FnHandler<C, M, R, ByClone, F>
where
    M: Any + Send + Clone,
    R: IntoReply,
    F: Fn(&mut C, M) -> R + Send + Sync,
{
    FnHandler::new(f)
}

/// Handles `M` through a mutable reference. Such a handler can only be the
/// last match.
pub fn mutable<C, M, R, F>(f: F) -> FnHandler<C, M, R, ByMut, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, &mut M) -> R + Send + Sync,
{
    FnHandler::new(f)
}

impl<C, M, R, F> Handler<C> for FnHandler<C, M, R, ByRef, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, &M) -> R + Send + Sync,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        capability_for::<M, R>(ty, Access::View)
    }

    fn message_types(&self) -> Vec<MessageType> {
        vec![MessageType::of::<M>()]
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        match message.downcast_ref::<M>() {
            Some(m) => finish((self.f)(ctx, m)),
            None => Err(refused::<M>(&message)),
        }
    }
}

impl<C, M, R, F> Handler<C> for FnHandler<C, M, R, ByValue, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, M) -> R + Send + Sync,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        capability_for::<M, R>(ty, Access::Owned)
    }

    fn message_types(&self) -> Vec<MessageType> {
        vec![MessageType::of::<M>()]
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let m = message.into_owned::<M>().map_err(|m| refused::<M>(&m))?;
        finish((self.f)(ctx, m))
    }
}

impl<C, M, R, F> Handler<C> for FnHandler<C, M, R, ByClone, F>
where
    M: Any + Send + Clone,
    R: IntoReply,
    F: Fn(&mut C, M) -> R + Send + Sync,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        capability_for::<M, R>(ty, Access::Cloned)
    }

    fn message_types(&self) -> Vec<MessageType> {
        vec![MessageType::of::<M>()]
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let m = if message.is_owned() {
            message.into_owned::<M>().map_err(|m| refused::<M>(&m))?
        } else {
            match message.downcast_ref::<M>() {
                Some(m) => m.clone(),
                None => return Err(refused::<M>(&message)),
            }
        };
        finish((self.f)(ctx, m))
    }
}

impl<C, M, R, F> Handler<C> for FnHandler<C, M, R, ByMut, F>
where
    M: Any + Send,
    R: IntoReply,
    F: Fn(&mut C, &mut M) -> R + Send + Sync,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        capability_for::<M, R>(ty, Access::Mut)
    }

    fn message_types(&self) -> Vec<MessageType> {
        vec![MessageType::of::<M>()]
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let mut m = message.into_owned::<M>().map_err(|m| refused::<M>(&m))?;
        finish((self.f)(ctx, &mut m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::{DispatchError, Hard, HandlerExt, Reply, Shape};

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    #[test]
    fn test_capability_follows_closure_signature() {
        let h = view(|_: &mut (), _: &Ping| Some(1_u8));
        let cap = h.capability(MessageType::of::<Ping>()).unwrap();
        assert_eq!(cap.access, Access::View);
        assert_eq!(cap.shape, Shape::Soft);
        assert_eq!(cap.reply, Some(MessageType::of::<u8>()));
        assert!(h.capability(MessageType::of::<String>()).is_none());

        let h = owned(|_: &mut (), p: Ping| Hard(p.0));
        let cap = h.capability(MessageType::of::<Ping>()).unwrap();
        assert_eq!(cap.access, Access::Owned);
        assert_eq!(cap.shape, Shape::Hard);

        let h = mutable(|_: &mut (), p: &mut Ping| p.0 += 1);
        let cap = h.capability(MessageType::of::<Ping>()).unwrap();
        assert_eq!((cap.access, cap.shape, cap.reply), (Access::Mut, Shape::Empty, None));
    }

    #[test]
    fn test_owned_handler_refuses_views() {
        let h = owned(|_: &mut (), p: Ping| Hard(p.0));
        let ping = Ping(3);
        let err = h.dispatch_view(&mut (), &ping).unwrap_err();
        assert!(matches!(err, DispatchError::Misrouted { .. }));

        let reply = h.dispatch_request::<_, u32>(&mut (), Ping(3)).unwrap();
        assert_eq!(reply, Reply::Hard(3));
    }

    #[test]
    fn test_cloned_handler_takes_views_and_values() {
        let h = cloned(|seen: &mut Vec<Ping>, p: Ping| seen.push(p));
        let mut seen = Vec::new();
        let ping = Ping(1);
        h.dispatch_view(&mut seen, &ping).unwrap();
        h.dispatch_event(&mut seen, Ping(2)).unwrap();
        assert_eq!(seen, vec![Ping(1), Ping(2)]);
    }

    #[test]
    fn test_wrong_type_is_not_handled() {
        let h = view(|_: &mut (), _: &Ping| ());
        let err = h.dispatch_event(&mut (), 5_i32).unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingHandler { .. }));
    }

    #[test]
    fn test_handler_errors_pass_through() {
        let h = view(|_: &mut (), p: &Ping| {
            if p.0 == 0 {
                Err("zero ping")
            } else {
                Ok(Hard(p.0))
            }
        });
        let err = h.dispatch_event(&mut (), Ping(0)).unwrap_err();
        assert_eq!(err.to_string(), "zero ping");
        assert!(err.is_handler_failure());
    }
}
