//! Resolution routing.
//!
//! [`First`] offers a message to its matching handlers in order and stops at
//! the first definite answer. The router's own answer shape is the strongest
//! shape among its matches:
//!
//! | members | router answers |
//! |---------|----------------|
//! | only `Empty` | `Empty` |
//! | some `Soft`, no `Hard` | `Soft`, `None` if nobody answered |
//! | a `Hard` | `Hard`, always |
//!
//! A `Hard` handler always answers, so handlers registered after it can
//! never run for that type. They are still checked for a matching reply type,
//! then dropped from the plan, which makes the `Hard` handler the one that
//! receives ownership.

use std::fmt;
use std::sync::Arc;

use switchboard_core::{
    AnyReply, BoxedHandler, Capability, CapabilityViolation, ContextAccess, Delivery,
    DispatchError, DispatchResult, Handler, MatchSet, MessageType, Shape, common_reply_type,
};
use tracing::{debug, trace};

use crate::plan::{PlanCache, declared_types};

/// The validated plan for one message type.
#[derive(Debug)]
struct Resolution {
    set: MatchSet,
    shape: Shape,
    reply: Option<MessageType>,
}

/// A router that returns the first definite answer.
pub struct First<C> {
    handlers: Vec<BoxedHandler<C>>,
    plans: PlanCache<Resolution>,
    name: Option<String>,
}

/// Builder for [`First`].
pub struct FirstBuilder<C> {
    handlers: Vec<BoxedHandler<C>>,
    name: Option<String>,
}

impl<C> Default for FirstBuilder<C> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            name: None,
        }
    }
}

impl<C> FirstBuilder<C> {
    /// Appends a handler.
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: Handler<C> + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Appends an already boxed handler.
    pub fn boxed(mut self, handler: BoxedHandler<C>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Sets a name for this router, used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Assembles the router, validating every declared message type.
    pub fn build(self) -> Result<First<C>, CapabilityViolation> {
        let first = First {
            handlers: self.handlers,
            plans: PlanCache::default(),
            name: self.name,
        };
        for ty in declared_types(first.handlers.iter().flat_map(|h| h.message_types())) {
            first.plan(ty)?;
        }
        debug!(
            router = first.label(),
            handlers = first.handlers.len(),
            planned = first.plans.len(),
            "First router assembled"
        );
        Ok(first)
    }
}

impl<C> First<C> {
    /// Starts building a router.
    pub fn builder() -> FirstBuilder<C> {
        FirstBuilder::default()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("first")
    }

    fn collect(&self, ty: MessageType) -> MatchSet {
        MatchSet::matching::<C, _>(ty, ContextAccess::Exclusive, &self.handlers)
    }

    fn plan(&self, ty: MessageType) -> Result<Arc<Resolution>, CapabilityViolation> {
        self.plans.get_or_try_insert(ty, || {
            let mut set = self.collect(ty);
            let reply = common_reply_type(ty, set.entries())?;
            let shadowed = set.truncate_after_hard();
            if !shadowed.is_empty() {
                debug!(
                    router = self.label(),
                    message = ty.name(),
                    shadowed = shadowed.len(),
                    "Handlers after a hard answer will never run"
                );
            }
            set.check_heads()?;
            let shape = set.shape();
            trace!(router = self.label(), message = ty.name(), ?shape, "Planned resolution");
            Ok(Resolution { set, shape, reply })
        })
    }
}

impl<C> Handler<C> for First<C> {
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        match self.plan(ty) {
            Ok(plan) => plan
                .set
                .access()
                .map(|access| Capability::new(access).answering(plan.shape, plan.reply)),
            Err(_) => self.collect(ty).access().map(Capability::new),
        }
    }

    fn message_types(&self) -> Vec<MessageType> {
        declared_types(self.handlers.iter().flat_map(|h| h.message_types()))
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let ty = message.message_type();
        let plan = self.plan(ty)?;
        let Some((tail, head)) = plan.set.entries().split_last() else {
            return Err(DispatchError::NoMatchingHandler { message: ty.name() });
        };

        for matched in head {
            let reply = self.handlers[matched.index].call(ctx, message.as_view())?;
            if let Some(value) = reply.into_value() {
                trace!(router = self.label(), index = matched.index, "Answered");
                return Ok(plan.shape.answer(value));
            }
        }

        let reply = self.handlers[tail.index].call(ctx, message)?;
        match reply.into_value() {
            Some(value) => {
                trace!(router = self.label(), index = tail.index, "Answered");
                Ok(plan.shape.answer(value))
            }
            None => plan
                .shape
                .absent()
                .ok_or(DispatchError::MissingReply { message: ty.name() }),
        }
    }
}

impl<C> fmt::Debug for First<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("First")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{any, owned, view};
    use switchboard_core::{Access, Hard, HandlerExt, MessageRef, Reply};

    struct MoveOnly(Box<i32>);

    struct Request;

    #[test]
    fn test_first_definite_answer_wins() {
        let router = First::builder()
            .handler(view(|calls: &mut Vec<u8>, _: &&'static str| calls.push(1)))
            .handler(view(|calls: &mut Vec<u8>, _: &&'static str| {
                calls.push(2);
                None::<i32>
            }))
            .handler(view(|calls: &mut Vec<u8>, _: &&'static str| {
                calls.push(3);
                Some(2)
            }))
            .handler(view(|calls: &mut Vec<u8>, _: &&'static str| {
                calls.push(4);
                Some(4)
            }))
            .build()
            .unwrap();

        let mut calls = Vec::new();
        let reply = router
            .dispatch_request::<_, i32>(&mut calls, "answer me")
            .unwrap();
        assert_eq!(reply, Reply::Soft(Some(2)));
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn test_soft_without_answer_is_none() {
        let router = First::builder()
            .handler(view(|_: &mut (), _: &Request| None::<u32>))
            .handler(view(|_: &mut (), _: &Request| ()))
            .build()
            .unwrap();
        let reply = router.dispatch_request::<_, u32>(&mut (), Request).unwrap();
        assert_eq!(reply, Reply::Soft(None));
    }

    #[test]
    fn test_hard_member_makes_the_router_hard() {
        let router = First::builder()
            .handler(view(|_: &mut (), n: &u32| (*n > 10).then_some(*n)))
            .handler(view(|_: &mut (), n: &u32| Hard(*n * 2)))
            .build()
            .unwrap();

        let cap = router.capability(MessageType::of::<u32>()).unwrap();
        assert_eq!(cap.shape, Shape::Hard);
        assert_eq!(cap.reply, Some(MessageType::of::<u32>()));

        assert_eq!(router.dispatch_request::<_, u32>(&mut (), 11_u32).unwrap(), Reply::Hard(11));
        assert_eq!(router.dispatch_request::<_, u32>(&mut (), 3_u32).unwrap(), Reply::Hard(6));
    }

    #[test]
    fn test_hard_owner_shadows_later_handlers() {
        let router = First::builder()
            .handler(any(|_: &mut Vec<&'static str>, _: MessageRef<'_>| ()))
            .handler(owned(|_: &mut Vec<&'static str>, m: MoveOnly| Hard(*m.0)))
            .handler(owned(|calls: &mut Vec<&'static str>, m: MoveOnly| {
                calls.push("shadowed");
                Hard(*m.0 + 1)
            }))
            .build()
            .unwrap();

        let cap = router.capability(MessageType::of::<MoveOnly>()).unwrap();
        assert_eq!(cap.access, Access::Owned);

        let mut calls = Vec::new();
        let reply = router
            .dispatch_request::<_, i32>(&mut calls, MoveOnly(Box::new(2)))
            .unwrap();
        assert_eq!(reply, Reply::Hard(2));
        assert!(calls.is_empty());
    }

    #[test]
    fn test_reply_types_must_agree_even_when_shadowed() {
        let result = First::builder()
            .handler(view(|_: &mut (), _: &Request| Hard(1_i32)))
            .handler(view(|_: &mut (), _: &Request| Hard("one")))
            .build();
        assert!(matches!(
            result,
            Err(CapabilityViolation::ReplyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_reply_type_request() {
        let router = First::builder()
            .handler(view(|_: &mut (), _: &Request| Hard(1_i32)))
            .build()
            .unwrap();
        let err = router.dispatch_request::<_, String>(&mut (), Request).unwrap_err();
        assert!(matches!(err, DispatchError::ReplyType { .. }));
    }

    struct SilentHard;

    impl Handler<()> for SilentHard {
        fn capability(&self, ty: MessageType) -> Option<Capability> {
            ty.is::<Request>()
                .then(|| Capability::view().answering(Shape::Hard, Some(MessageType::of::<u8>())))
        }

        fn call(&self, _: &mut (), _: Delivery<'_>) -> DispatchResult<AnyReply> {
            Ok(Reply::Empty)
        }
    }

    #[test]
    fn test_missing_hard_answer_is_an_error() {
        let router = First::builder().handler(SilentHard).build().unwrap();
        let err = router.dispatch_request::<_, u8>(&mut (), Request).unwrap_err();
        assert!(matches!(err, DispatchError::MissingReply { .. }));
    }
}
