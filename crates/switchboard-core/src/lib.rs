//! # Switchboard Core
//!
//! The message, reply and capability model the Switchboard routers are built on.
//!
//! - **Messages** are keyed by their raw type ([`MessageType`]) and handed to
//!   a handler either as a view or with ownership ([`Delivery`]).
//! - **Replies** come in three shapes ([`Reply`]): `Empty`, `Soft` and `Hard`.
//! - **Capabilities** ([`Capability`]) say whether a handler takes a message
//!   type, by which reference kind, and how it answers.
//! - **Handlers** ([`Handler`]) are erased over the message type, so routers
//!   can hold heterogeneous handlers and nest inside each other.
//!
//! ```text
//!  dispatch(ctx, M)
//!        │
//!        ▼
//!  ┌────────────┐   capability(M)?   ┌───────────┐
//!  │   Router   │───────────────────▶│ handler 0 │  view
//!  │            │───────────────────▶│ handler 2 │  view
//!  │            │───────────────────▶│ handler 3 │  ownership (tail)
//!  └────────────┘                    └───────────┘
//! ```

pub mod capability;
pub mod error;
pub mod handler;
pub mod message;
pub mod reply;

pub use capability::{
    Access, Capability, ContextAccess, MatchSet, Matched, Surrogate, common_reply_type, matches,
};
pub use error::{BoxError, CapabilityViolation, DispatchError, DispatchResult};
pub use handler::{BoxedHandler, Handler, HandlerExt};
pub use message::{Delivery, MessageRef, MessageType, Payload};
pub use reply::{AnyReply, Hard, IntoReply, Reply, Shape};
