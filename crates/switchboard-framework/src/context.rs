//! Dispatch context.
//!
//! A [`Context`] bundles application state with the routers that serve it:
//! one for events and one for requests. Handlers receive `&mut Context<S>`,
//! so they can read and change the state and dispatch further messages
//! through the same routers while they run.
//!
//! ```rust,ignore
//! let events = Serial::builder()
//!     .handler(view(|ctx: &mut Context<App>, e: &Resize| {
//!         ctx.width = e.0;
//!         ctx.dispatch_event(Redraw)
//!     }))
//!     .build()?;
//!
//! let mut ctx = Context::builder(App::default()).events(events).build();
//! ctx.dispatch_event(Resize(640))?;
//! ```

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use switchboard_core::{
    AnyReply, BoxedHandler, Capability, Delivery, DispatchError, DispatchResult, Handler,
    HandlerExt, MessageType, Reply,
};
use tracing::{Level, span};

/// The routers a context dispatches through.
struct Routes<S> {
    events: BoxedHandler<Context<S>>,
    requests: BoxedHandler<Context<S>>,
}

/// Stands in for a router that was never configured.
struct Unrouted;

impl<C> Handler<C> for Unrouted {
    fn capability(&self, _ty: MessageType) -> Option<Capability> {
        None
    }

    fn call(&self, _ctx: &mut C, message: Delivery<'_>) -> DispatchResult<AnyReply> {
        Err(DispatchError::NoMatchingHandler {
            message: message.message_type().name(),
        })
    }
}

/// Application state plus the routers that act on it.
pub struct Context<S> {
    state: S,
    routes: Arc<Routes<S>>,
}

/// Builder for [`Context`].
pub struct ContextBuilder<S> {
    state: S,
    events: Option<BoxedHandler<Context<S>>>,
    requests: Option<BoxedHandler<Context<S>>>,
}

impl<S: 'static> ContextBuilder<S> {
    /// Sets the router for events.
    pub fn events<H>(mut self, router: H) -> Self
    where
        H: Handler<Context<S>> + 'static,
    {
        self.events = Some(Box::new(router));
        self
    }

    /// Sets the router for requests.
    pub fn requests<H>(mut self, router: H) -> Self
    where
        H: Handler<Context<S>> + 'static,
    {
        self.requests = Some(Box::new(router));
        self
    }

    /// Builds the context. A router that was not set accepts nothing.
    pub fn build(self) -> Context<S> {
        Context {
            state: self.state,
            routes: Arc::new(Routes {
                events: self.events.unwrap_or_else(|| Box::new(Unrouted)),
                requests: self.requests.unwrap_or_else(|| Box::new(Unrouted)),
            }),
        }
    }
}

impl<S: 'static> Context<S> {
    /// Starts building a context around `state`.
    pub fn builder(state: S) -> ContextBuilder<S> {
        ContextBuilder {
            state,
            events: None,
            requests: None,
        }
    }
}

impl<S> Context<S> {
    /// Returns the application state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Returns the application state mutably.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Consumes the context, returning the state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Dispatches an event through the event router.
    pub fn dispatch_event<M>(&mut self, event: M) -> DispatchResult<()>
    where
        M: Any + Send,
    {
        let routes = Arc::clone(&self.routes);
        let span = span!(
            Level::DEBUG,
            "dispatch_event",
            message = std::any::type_name::<M>()
        );
        let _enter = span.enter();
        routes.events.dispatch_event(self, event)
    }

    /// Dispatches a request through the request router and recovers a typed
    /// answer.
    pub fn dispatch_request<M, T>(&mut self, request: M) -> DispatchResult<Reply<T>>
    where
        M: Any + Send,
        T: Any,
    {
        let routes = Arc::clone(&self.routes);
        let span = span!(
            Level::DEBUG,
            "dispatch_request",
            message = std::any::type_name::<M>(),
            reply = std::any::type_name::<T>()
        );
        let _enter = span.enter();
        routes.requests.dispatch_request(self, request)
    }

    /// Builds a second context with its own state but the same routers.
    pub fn fork(&self, state: S) -> Self {
        Self {
            state,
            routes: Arc::clone(&self.routes),
        }
    }
}

impl<S> Deref for Context<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S> DerefMut for Context<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

impl<S: fmt::Debug> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::view;
    use crate::{First, MustHandle, Serial};
    use switchboard_core::Hard;

    #[derive(Debug, Default)]
    struct App {
        log: Vec<String>,
    }

    struct Click(u32);
    struct Lookup(u32);
    struct Orphan;

    fn context() -> Context<App> {
        let events = Serial::builder()
            .handler(view(|ctx: &mut Context<App>, click: &Click| -> DispatchResult<()> {
                let Reply::Hard(label) = ctx.dispatch_request::<_, String>(Lookup(click.0))? else {
                    return Ok(());
                };
                ctx.log.push(label);
                Ok(())
            }))
            .build()
            .unwrap();
        let requests = First::builder()
            .handler(view(|_: &mut Context<App>, q: &Lookup| Hard(format!("button {}", q.0))))
            .build()
            .unwrap();
        Context::builder(App::default())
            .events(MustHandle::new(events))
            .requests(requests)
            .build()
    }

    #[test]
    fn test_handlers_dispatch_nested_requests() {
        let mut ctx = context();
        ctx.dispatch_event(Click(1)).unwrap();
        ctx.dispatch_event(Click(2)).unwrap();
        assert_eq!(ctx.log, vec!["button 1".to_string(), "button 2".to_string()]);
    }

    #[test]
    fn test_unrouted_and_unhandled_messages() {
        let mut ctx = context();
        let err = ctx.dispatch_event(Orphan).unwrap_err();
        assert!(matches!(err, DispatchError::Unhandled { .. }));

        let mut bare = Context::builder(()).build();
        let err = bare.dispatch_request::<_, u8>(Orphan).unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingHandler { .. }));
    }

    #[test]
    fn test_nested_dispatch_errors_surface_unchanged() {
        let events = Serial::builder()
            .handler(view(|ctx: &mut Context<()>, _: &Click| {
                ctx.dispatch_request::<_, u8>(Orphan).map(drop)
            }))
            .build()
            .unwrap();
        let mut ctx = Context::builder(()).events(events).build();
        let err = ctx.dispatch_event(Click(0)).unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingHandler { .. }));
    }

    #[test]
    fn test_fork_shares_routes() {
        let ctx = context();
        let mut other = ctx.fork(App::default());
        other.dispatch_event(Click(9)).unwrap();
        assert_eq!(other.into_state().log, vec!["button 9".to_string()]);
        assert!(ctx.log.is_empty());
    }
}
