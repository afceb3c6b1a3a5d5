//! Broadcast routing.
//!
//! [`Serial`] delivers a message to every handler that matches it, in
//! registration order. All but the last match see a shared view; the last one
//! receives the delivery the router was given, so ownership is handed over at
//! most once and only at the very end. Answers are discarded.
//!
//! # Example
//!
//! ```rust,ignore
//! let router = Serial::builder()
//!     .handler(view(|log: &mut Vec<String>, e: &Resize| log.push(format!("{e:?}"))))
//!     .handler(owned(|_: &mut Vec<String>, e: Resize| store(e)))
//!     .build()?;
//!
//! router.dispatch_event(&mut log, Resize(640, 480))?;
//! ```

use std::fmt;
use std::sync::Arc;

use switchboard_core::{
    AnyReply, BoxedHandler, Capability, CapabilityViolation, ContextAccess, Delivery,
    DispatchError, DispatchResult, Handler, MatchSet, MessageType, Reply,
};
use tracing::{debug, trace};

use crate::plan::{PlanCache, declared_types};

/// A router that runs every matching handler in order.
pub struct Serial<C> {
    handlers: Vec<BoxedHandler<C>>,
    plans: PlanCache<MatchSet>,
    name: Option<String>,
}

/// Builder for [`Serial`].
pub struct SerialBuilder<C> {
    handlers: Vec<BoxedHandler<C>>,
    name: Option<String>,
}

impl<C> Default for SerialBuilder<C> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            name: None,
        }
    }
}

impl<C> SerialBuilder<C> {
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

    /// Assembles the router.
    ///
    /// Every message type a child declares is planned here, so a handler that
    /// needs ownership but is followed by another match is rejected before
    /// anything is dispatched.
    pub fn build(self) -> Result<Serial<C>, CapabilityViolation> {
        let serial = Serial {
            handlers: self.handlers,
            plans: PlanCache::default(),
            name: self.name,
        };
        for ty in serial.declared() {
            serial.plan(ty)?;
        }
        debug!(
            router = serial.label(),
            handlers = serial.handlers.len(),
            planned = serial.plans.len(),
            "Serial router assembled"
        );
        Ok(serial)
    }
}

impl<C> Serial<C> {
    /// Starts building a router.
    pub fn builder() -> SerialBuilder<C> {
        SerialBuilder::default()
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
        self.name.as_deref().unwrap_or("serial")
    }

    fn declared(&self) -> Vec<MessageType> {
        declared_types(self.handlers.iter().flat_map(|h| h.message_types()))
    }

    fn collect(&self, ty: MessageType) -> MatchSet {
        MatchSet::matching::<C, _>(ty, ContextAccess::Exclusive, &self.handlers)
    }

    fn plan(&self, ty: MessageType) -> Result<Arc<MatchSet>, CapabilityViolation> {
        self.plans.get_or_try_insert(ty, || {
            let set = self.collect(ty);
            set.check_heads()?;
            trace!(
                router = self.label(),
                message = ty.name(),
                matched = set.len(),
                "Planned broadcast"
            );
            Ok(set)
        })
    }
}

impl<C> Handler<C> for Serial<C> {
    fn capability(&self, ty: MessageType) -> Option<Capability> {
        let access = match self.plan(ty) {
            Ok(set) => set.access(),
            Err(_) => self.collect(ty).access(),
        };
        access.map(Capability::new)
    }

    fn message_types(&self) -> Vec<MessageType> {
        self.declared()
    }

    fn call(&self, ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        let ty = message.message_type();
        let plan = self.plan(ty)?;
        let Some((tail, head)) = plan.entries().split_last() else {
            return Err(DispatchError::NoMatchingHandler { message: ty.name() });
        };

        for matched in head {
            trace!(router = self.label(), index = matched.index, "Calling with view");
            self.handlers[matched.index].call(ctx, message.as_view())?;
        }
        trace!(router = self.label(), index = tail.index, "Calling tail");
        self.handlers[tail.index].call(ctx, message)?;

        Ok(Reply::Empty)
    }
}

impl<C> fmt::Debug for Serial<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serial")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
