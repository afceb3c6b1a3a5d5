//! Runtime-sized broadcast routing.
//!
//! [`Dynamic`] holds any number of handlers of one type and works out the
//! matching subset on every dispatch. It follows the same ownership rule as
//! [`Serial`](crate::Serial): views for every match but the last, the
//! delivery itself for the last. An empty collection, or one where nothing
//! matches, silently does nothing.
//!
//! The collection is fixed once the router is built.

use std::fmt;

use switchboard_core::{
    AnyReply, Capability, ContextAccess, Delivery, DispatchResult, Handler, MatchSet,
    MessageType, Reply,
};
use tracing::trace;

use crate::plan::declared_types;

/// A broadcast router over a runtime collection of one handler type.
pub struct Dynamic<H> {
    handlers: Vec<H>,
}

impl<H> Dynamic<H> {
    /// Wraps a collection of handlers.
    pub fn new(handlers: Vec<H>) -> Self {
        Self { handlers }
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if there are no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H> Default for Dynamic<H> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<H> FromIterator<H> for Dynamic<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<H> From<Vec<H>> for Dynamic<H> {
    fn from(handlers: Vec<H>) -> Self {
        Self::new(handlers)
    }
}

impl<C, H> Handler<C> for Dynamic<H>
where
    H: Handler<C>,
{
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        let set = MatchSet::matching::<C, _>(ty, ContextAccess::Exclusive, &self.handlers);
        set.access().map(Capability::new)
    }

    fn message_types(&self) -> Vec<MessageType> {
        declared_types(self.handlers.iter().flat_map(|h| h.message_types()))
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let ty = message.message_type();
        let set = MatchSet::matching::<C, _>(ty, ContextAccess::Exclusive, &self.handlers);
        let Some((tail, head)) = set.entries().split_last() else {
            trace!(message = ty.name(), handlers = self.handlers.len(), "Nothing to do");
            return Ok(Reply::Empty);
        };
        set.check_heads()?;

        for matched in head {
            self.handlers[matched.index].call(ctx, message.as_view())?;
        }
        self.handlers[tail.index].call(ctx, message)?;
        Ok(Reply::Empty)
    }
}

impl<H> fmt::Debug for Dynamic<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{owned, view};
    use switchboard_core::{BoxedHandler, CapabilityViolation, DispatchError, HandlerExt};

    struct MoveOnly(Box<u8>);

    #[derive(Default)]
    struct Seen {
        views: usize,
        owned: usize,
    }

    #[test]
    fn test_empty_collection_is_a_no_op() {
        let dynamic: Dynamic<BoxedHandler<Seen>> = Dynamic::default();
        let mut seen = Seen::default();
        dynamic.dispatch_event(&mut seen, MoveOnly(Box::new(1))).unwrap();
        assert!(Handler::<Seen>::capability(&dynamic, MessageType::of::<MoveOnly>()).is_none());
        assert_eq!(seen.views + seen.owned, 0);
    }

    #[test]
    fn test_last_match_takes_ownership() {
        let mut handlers: Vec<BoxedHandler<Seen>> = (0..3)
            .map(|_| Box::new(view(|s: &mut Seen, _: &MoveOnly| s.views += 1)) as BoxedHandler<Seen>)
            .collect();
        handlers.push(Box::new(view(|s: &mut Seen, _: &String| s.views += 100)));
        handlers.push(Box::new(owned(|s: &mut Seen, m: MoveOnly| s.owned += usize::from(*m.0))));
        let dynamic = Dynamic::from(handlers);

        let mut seen = Seen::default();
        dynamic.dispatch_event(&mut seen, MoveOnly(Box::new(1))).unwrap();
        assert_eq!(seen.views, 3);
        assert_eq!(seen.owned, 1);
    }

    #[test]
    fn test_homogeneous_collection() {
        let adder = || view(|n: &mut u32, m: &u32| *n += *m);
        let dynamic: Dynamic<_> = (0..2).map(|_| adder()).collect();
        let mut n = 1;
        dynamic.dispatch_event(&mut n, 2_u32).unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn test_owning_head_is_rejected_before_any_call() {
        let dynamic: Dynamic<BoxedHandler<Seen>> = Dynamic::new(vec![
            Box::new(owned(|s: &mut Seen, _: MoveOnly| s.owned += 1)),
            Box::new(view(|s: &mut Seen, _: &MoveOnly| s.views += 1)),
        ]);
        let mut seen = Seen::default();
        let err = dynamic.dispatch_event(&mut seen, MoveOnly(Box::new(1))).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Capability(CapabilityViolation::OwnershipInHead { index: 0, .. })
        ));
        assert_eq!(seen.views + seen.owned, 0);
    }
}
