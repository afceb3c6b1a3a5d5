//! # Switchboard
//!
//! Type-directed, in-process message dispatch.
//!
//! ## Overview
//!
//! Messages are plain Rust values. Handlers are closures (or any
//! [`Handler`](core::Handler)) that say which message types they take, whether
//! they need to own the message, and how they answer. Routers pick the
//! participating handlers per message type, hand every one of them a shared
//! view except the last, which gets ownership, and nest inside each other.
//!
//! ```text
//! ┌─────────┐   event    ┌────────────────────────┐
//! │ Context │───────────▶│ MustHandle(Serial[..]) │──▶ every matching handler
//! │ (state) │  request   ├────────────────────────┤
//! │         │───────────▶│ First[..]              │──▶ first definite answer
//! └─────────┘            └────────────────────────┘
//! ```
//!
//! - **Serial**: broadcast; every match runs, views first, ownership last
//! - **First**: resolution; stops at the first definite answer
//! - **Dynamic**: a runtime-sized broadcast over one handler type
//! - **MustHandle**: an unmatched message becomes an error
//! - **Buffered**: runs a handler on its own worker thread
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! let events = MustHandle::new(serial![
//!     any(|_: &mut Context<App>, m: MessageRef<'_>| debug!(message = m.type_name())),
//!     owned(|ctx: &mut Context<App>, e: Resize| ctx.size = e.0),
//! ]?);
//! let requests = first![view(|ctx: &mut Context<App>, _: &GetSize| Hard(ctx.size))]?;
//!
//! let mut ctx = Context::builder(App::default())
//!     .events(events)
//!     .requests(requests)
//!     .build();
//! ctx.dispatch_event(Resize(640))?;
//! let size = ctx.dispatch_request::<_, u32>(GetSize)?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `switchboard.toml` files (default)
//! - `json-log`: JSON log output

pub use switchboard_core as core;
pub use switchboard_framework as framework;
pub use switchboard_runtime as runtime;

pub use switchboard_framework::{first, serial};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    // Message and reply model
    pub use switchboard_core::{
        AnyReply, Capability, CapabilityViolation, DispatchError, DispatchResult, Hard, Handler,
        HandlerExt, MessageRef, MessageType, Reply, Shape,
    };

    // Routers, guards and handler constructors
    pub use switchboard_framework::{
        Context, Dynamic, First, MustHandle, Serial, any, cloned, first, mutable, owned, serial,
        view,
    };

    // Offloading
    pub use switchboard_runtime::{
        Buffered, OffloadConfig, OffloadError, PendingResult, SharedContext,
    };

    // Logging macros
    pub use switchboard_runtime::tracing::{debug, error, info, trace, warn};
}
