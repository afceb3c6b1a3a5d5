//! Error types shared by every router.

use thiserror::Error;

/// A boxed error raised inside a handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An invalid composition, found while assembling a router or, for types only
/// reached through catch-all handlers, when a message type is first planned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityViolation {
    /// A handler that needs ownership is followed by another match.
    #[error(
        "handler #{index} needs ownership of `{message}` but is not the last handler to match it"
    )]
    OwnershipInHead {
        /// The message type.
        message: &'static str,
        /// Registration index of the offending handler.
        index: usize,
    },

    /// Handlers matching one request answer with different value types.
    #[error("handlers for `{message}` answer with both `{expected}` and `{found}`")]
    ReplyTypeMismatch {
        /// The message type.
        message: &'static str,
        /// The first reply type seen.
        expected: &'static str,
        /// The conflicting reply type.
        found: &'static str,
    },
}

/// Errors surfaced by a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The router has no handler for this message type.
    #[error("no handler accepts `{message}`")]
    NoMatchingHandler {
        /// The message type.
        message: &'static str,
    },

    /// An exhaustive router was given a message none of its handlers accept.
    #[error("`{message}` must be handled but no handler accepts it")]
    Unhandled {
        /// The message type.
        message: &'static str,
    },

    /// The router composition is invalid for this message type.
    #[error(transparent)]
    Capability(#[from] CapabilityViolation),

    /// A handler failed. The error is passed through unchanged.
    #[error("{0}")]
    Handler(#[source] BoxError),

    /// A handler was given a payload it cannot take.
    #[error("handler for `{expected}` was given {found}")]
    Misrouted {
        /// What the handler accepts.
        expected: &'static str,
        /// What it received.
        found: String,
    },

    /// The caller asked for a reply type the router does not produce.
    #[error("`{message}` is answered with another type than `{expected}`")]
    ReplyType {
        /// The message type.
        message: &'static str,
        /// The reply type the caller asked for.
        expected: &'static str,
    },

    /// A router declared a definite answer but no handler produced one.
    #[error("no handler produced the required answer for `{message}`")]
    MissingReply {
        /// The message type.
        message: &'static str,
    },
}

impl DispatchError {
    /// Wraps a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NoMatchingHandler { .. } => "dispatch_no_matching_handler",
            DispatchError::Unhandled { .. } => "dispatch_unhandled",
            DispatchError::Capability(_) => "dispatch_capability_violation",
            DispatchError::Handler(_) => "dispatch_handler_failed",
            DispatchError::Misrouted { .. } => "dispatch_misrouted",
            DispatchError::ReplyType { .. } => "dispatch_reply_type",
            DispatchError::MissingReply { .. } => "dispatch_missing_reply",
        }
    }

    /// Returns `true` for failures raised by a handler rather than the router.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, DispatchError::Handler(_))
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
