//! # Switchboard Framework
//!
//! Routers and handlers built on the `switchboard-core` capability model.
//!
//! - [`Serial`]: runs every matching handler, views first, ownership last.
//! - [`First`]: returns the first definite answer.
//! - [`Dynamic`]: a broadcast over a runtime collection of one handler type.
//! - [`MustHandle`]: turns an unmatched message into an error.
//! - [`Context`]: state plus event and request routers, reachable from handlers.
//!
//! Routers are handlers, so they nest freely. A router is checked when it is
//! assembled: a handler that needs ownership of a message type must be the
//! last one in the router to match that type.
//!
//! ```rust,ignore
//! use switchboard_framework::{First, MustHandle, Serial, any, owned, view};
//!
//! let events = MustHandle::new(serial![
//!     any(|_: &mut App, m: MessageRef<'_>| tracing::debug!(message = m.type_name())),
//!     view(|app: &mut App, e: &Resize| app.resize(e)),
//!     owned(|app: &mut App, e: Resize| app.remember(e)),
//! ]?);
//! ```

mod macros;
mod plan;

pub mod context;
pub mod dynamic;
pub mod first;
pub mod handler;
pub mod must_handle;
pub mod serial;

pub use context::{Context, ContextBuilder};
pub use dynamic::Dynamic;
pub use first::{First, FirstBuilder};
pub use handler::{AnyHandler, FnHandler, any, cloned, mutable, owned, view};
pub use must_handle::MustHandle;
pub use serial::{Serial, SerialBuilder};
