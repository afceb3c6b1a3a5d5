//! Capability matching.
//!
//! A handler's capability for a message type says which reference kinds it
//! accepts and how it answers. Matching never looks at how the caller holds
//! the message: a handler matches `M` when it admits at least one of the
//! owned, mutable or shared surrogates of `M`.
//!
//! [`MatchSet`] is the ordered subset of a router's handlers that match one
//! message type. Its last entry is the *tail*, the only one that may receive
//! ownership; every other entry is part of the *head* and gets a shared view.

use crate::error::CapabilityViolation;
use crate::handler::Handler;
use crate::message::MessageType;
use crate::reply::Shape;

/// The reference kind a handler takes its message by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// `&M`.
    View,
    /// `M`; needs ownership.
    Owned,
    /// `M`, cloned out of a view when ownership is not on offer.
    Cloned,
    /// `&mut M`; served from an owned message.
    Mut,
}

/// A synthetic stand-in for "the message, held a certain way".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surrogate {
    /// The message by value.
    Owned,
    /// A mutable reference to the message.
    Mutable,
    /// A shared reference to the message.
    Shared,
}

impl Surrogate {
    /// Every surrogate, in probing order.
    pub const ALL: [Surrogate; 3] = [Surrogate::Owned, Surrogate::Mutable, Surrogate::Shared];
}

impl Access {
    /// Returns `true` if a handler with this access can be called with `surrogate`.
    pub fn admits(self, surrogate: Surrogate) -> bool {
        match (self, surrogate) {
            (Access::View | Access::Cloned, _) => true,
            (Access::Owned, Surrogate::Owned) => true,
            (Access::Owned, _) => false,
            (Access::Mut, Surrogate::Owned | Surrogate::Mutable) => true,
            (Access::Mut, Surrogate::Shared) => false,
        }
    }

    /// Returns `true` if the handler can sit in a head position.
    pub fn accepts_view(self) -> bool {
        self.admits(Surrogate::Shared)
    }

    /// Returns `true` if the handler can only run with ownership.
    pub fn needs_ownership(self) -> bool {
        !self.accepts_view()
    }
}

/// What a handler can do with one message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// The reference kind the handler takes.
    pub access: Access,
    /// The declared answer shape.
    pub shape: Shape,
    /// The answer's value type; `None` for `Empty`.
    pub reply: Option<MessageType>,
}

impl Capability {
    /// A capability with the given access and no answer.
    pub fn new(access: Access) -> Self {
        Self {
            access,
            shape: Shape::Empty,
            reply: None,
        }
    }

    /// A view-only capability with no answer.
    pub fn view() -> Self {
        Self::new(Access::View)
    }

    /// Sets the declared answer.
    pub fn answering(mut self, shape: Shape, reply: Option<MessageType>) -> Self {
        self.shape = shape;
        self.reply = if shape == Shape::Empty { None } else { reply };
        self
    }
}

/// The kind of context reference available where a capability is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextAccess {
    /// Only `&C` is available.
    Shared,
    /// `&mut C` is available.
    Exclusive,
}

/// Returns `true` if `handler` is eligible for messages of type `ty`.
///
/// The answer depends on the handler and the raw message type only. The
/// context access is accepted for symmetry with call sites but does not narrow
/// the answer: handlers always run with `&mut C`, so a match found under
/// [`ContextAccess::Shared`] is a discovery result, not a promise that the
/// handler can run there.
pub fn matches<C, H>(handler: &H, _context: ContextAccess, ty: MessageType) -> bool
where
    H: Handler<C> + ?Sized,
{
    handler
        .capability(ty)
        .is_some_and(|cap| Surrogate::ALL.iter().any(|s| cap.access.admits(*s)))
}

/// One matching handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched {
    /// Registration index within the router.
    pub index: usize,
    /// The handler's capability for the message type.
    pub capability: Capability,
}

/// The ordered handlers matching one message type.
#[derive(Debug, Clone)]
pub struct MatchSet {
    ty: MessageType,
    entries: Vec<Matched>,
}

impl MatchSet {
    /// Collects the match set from per-handler capabilities in registration order.
    pub fn collect<I>(ty: MessageType, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Option<Capability>>,
    {
        let entries = capabilities
            .into_iter()
            .enumerate()
            .filter_map(|(index, cap)| cap.map(|capability| Matched { index, capability }))
            .collect();
        Self { ty, entries }
    }

    /// Collects the match set of `handlers` for `ty`, keeping the handlers
    /// that [`matches`] accepts.
    pub fn matching<'h, C, H>(
        ty: MessageType,
        context: ContextAccess,
        handlers: impl IntoIterator<Item = &'h H>,
    ) -> Self
    where
        H: Handler<C> + ?Sized + 'h,
    {
        Self::collect(
            ty,
            handlers.into_iter().map(|h| {
                if matches::<C, H>(h, context, ty) {
                    h.capability(ty)
                } else {
                    None
                }
            }),
        )
    }

    /// The message type this set was collected for.
    pub fn message_type(&self) -> MessageType {
        self.ty
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of matching handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All matches in registration order.
    pub fn entries(&self) -> &[Matched] {
        &self.entries
    }

    /// All matches except the last.
    pub fn head(&self) -> &[Matched] {
        match self.entries.split_last() {
            Some((_, head)) => head,
            None => &[],
        }
    }

    /// The last match.
    pub fn tail(&self) -> Option<&Matched> {
        self.entries.last()
    }

    /// Drops every match after the first `Hard` one.
    ///
    /// A `Hard` answer ends a resolution dispatch, so later handlers can never
    /// run and the `Hard` handler becomes the tail. Returns the dropped entries.
    pub fn truncate_after_hard(&mut self) -> Vec<Matched> {
        match self
            .entries
            .iter()
            .position(|m| m.capability.shape == Shape::Hard)
        {
            Some(pos) => self.entries.split_off(pos + 1),
            None => Vec::new(),
        }
    }

    /// Checks that every head entry can take a shared view.
    pub fn check_heads(&self) -> Result<(), CapabilityViolation> {
        match self.head().iter().find(|m| !m.capability.access.accepts_view()) {
            Some(m) => Err(CapabilityViolation::OwnershipInHead {
                message: self.ty.name(),
                index: m.index,
            }),
            None => Ok(()),
        }
    }

    /// The merged shape of the set.
    pub fn shape(&self) -> Shape {
        self.entries
            .iter()
            .fold(Shape::Empty, |acc, m| acc.merge(m.capability.shape))
    }

    /// The access the set needs as a whole when it is nested in another router.
    pub fn access(&self) -> Option<Access> {
        let tail = self.tail()?;
        Some(match tail.capability.access {
            Access::View => Access::View,
            Access::Cloned => Access::Cloned,
            Access::Owned | Access::Mut => Access::Owned,
        })
    }
}

/// Checks that every answering entry uses the same reply value type.
///
/// Returns the common reply type, if any entry answers.
pub fn common_reply_type<'a, I>(
    ty: MessageType,
    entries: I,
) -> Result<Option<MessageType>, CapabilityViolation>
where
    I: IntoIterator<Item = &'a Matched>,
{
    let mut common: Option<MessageType> = None;
    for m in entries {
        let Some(reply) = m.capability.reply else {
            continue;
        };
        match common {
            None => common = Some(reply),
            Some(expected) if expected != reply => {
                return Err(CapabilityViolation::ReplyTypeMismatch {
                    message: ty.name(),
                    expected: expected.name(),
                    found: reply.name(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(common)
}
