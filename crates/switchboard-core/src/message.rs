//! Message identity and the payload handed to a single handler.
//!
//! Dispatch is keyed by the *raw* type of a message. Whether the caller holds
//! the message by value or by reference does not change its [`MessageType`];
//! the reference kind only shows up in the [`Delivery`] a handler receives.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The raw type of a message, used as the dispatch key.
///
/// Two `MessageType`s are equal when their [`TypeId`]s are equal; the name is
/// carried along for diagnostics only.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Returns the message type of `M`.
    pub fn of<M: Any>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the message type of `M`.
    pub fn is<M: Any>(&self) -> bool {
        self.id == TypeId::of::<M>()
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.name).finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How the message is held by a [`Delivery`].
pub enum Payload<'a> {
    /// A shared view; the handler must not keep the message.
    View(&'a (dyn Any + Send)),
    /// Full ownership of the message.
    Owned(Box<dyn Any + Send>),
}

/// A type-erased message on its way into one handler.
///
/// Routers hand every head handler a view and the tail handler the delivery
/// they received themselves, so only one handler per dispatch can ever see
/// [`Payload::Owned`].
pub struct Delivery<'a> {
    ty: MessageType,
    payload: Payload<'a>,
}

impl Delivery<'static> {
    /// Creates an owning delivery.
    pub fn owned<M: Any + Send>(message: M) -> Self {
        Self {
            ty: MessageType::of::<M>(),
            payload: Payload::Owned(Box::new(message)),
        }
    }

    /// Rebuilds an owning delivery from a boxed message of type `ty`.
    ///
    /// Used when a message has crossed a thread boundary in erased form.
    pub fn from_boxed(ty: MessageType, message: Box<dyn Any + Send>) -> Self {
        Self {
            ty,
            payload: Payload::Owned(message),
        }
    }
}

impl<'a> Delivery<'a> {
    /// Creates a view delivery.
    pub fn view<M: Any + Send>(message: &'a M) -> Self {
        Self {
            ty: MessageType::of::<M>(),
            payload: Payload::View(message),
        }
    }

    /// Returns the raw type of the carried message.
    pub fn message_type(&self) -> MessageType {
        self.ty
    }

    /// Returns `true` if this delivery carries ownership.
    pub fn is_owned(&self) -> bool {
        matches!(self.payload, Payload::Owned(_))
    }

    /// Reborrows this delivery as a view, keeping ownership where it is.
    pub fn as_view(&self) -> Delivery<'_> {
        Delivery {
            ty: self.ty,
            payload: Payload::View(self.as_any()),
        }
    }

    /// Returns a view of the message suitable for catch-all handlers.
    pub fn peek(&self) -> MessageRef<'_> {
        MessageRef {
            ty: self.ty,
            value: self.as_any(),
        }
    }

    /// Borrows the message as `M`, regardless of how it is held.
    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.as_any().downcast_ref()
    }

    /// Takes ownership of the message as `M`.
    ///
    /// Fails, returning the delivery untouched, if this is a view or the
    /// message is not an `M`.
    pub fn into_owned<M: Any>(self) -> Result<M, Self> {
        match self.payload {
            Payload::Owned(boxed) => match boxed.downcast::<M>() {
                Ok(message) => Ok(*message),
                Err(boxed) => Err(Self {
                    ty: self.ty,
                    payload: Payload::Owned(boxed),
                }),
            },
            view @ Payload::View(_) => Err(Self {
                ty: self.ty,
                payload: view,
            }),
        }
    }

    /// Takes the boxed message, or `None` for a view.
    pub fn into_boxed(self) -> Option<Box<dyn Any + Send>> {
        match self.payload {
            Payload::Owned(boxed) => Some(boxed),
            Payload::View(_) => None,
        }
    }

    fn as_any(&self) -> &(dyn Any + Send) {
        match &self.payload {
            Payload::View(value) => *value,
            Payload::Owned(boxed) => boxed.as_ref(),
        }
    }
}

impl fmt::Debug for Delivery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("message", &self.ty)
            .field("owned", &self.is_owned())
            .finish()
    }
}

/// A read-only view of a message of any type.
///
/// Catch-all handlers receive this instead of a typed reference.
#[derive(Clone, Copy)]
pub struct MessageRef<'a> {
    ty: MessageType,
    value: &'a (dyn Any + Send),
}

impl<'a> MessageRef<'a> {
    /// Returns the raw type of the message.
    pub fn message_type(&self) -> MessageType {
        self.ty
    }

    /// Returns the type name of the message.
    pub fn type_name(&self) -> &'static str {
        self.ty.name()
    }

    /// Returns `true` if the message is an `M`.
    pub fn is<M: Any>(&self) -> bool {
        self.ty.is::<M>()
    }

    /// Borrows the message as `M`.
    pub fn downcast_ref<M: Any>(&self) -> Option<&'a M> {
        self.value.downcast_ref()
    }

    /// Returns the address of the message, stable for the whole dispatch.
    pub fn addr(&self) -> *const () {
        self.value as *const (dyn Any + Send) as *const ()
    }
}

impl fmt::Debug for MessageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageRef").field(&self.ty).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MoveOnly(String);

    #[test]
    fn test_message_type_ignores_reference_kind() {
        let owned = Delivery::owned(MoveOnly("a".into()));
        let message = MoveOnly("b".into());
        let view = Delivery::view(&message);

        assert_eq!(owned.message_type(), view.message_type());
        assert!(owned.message_type().is::<MoveOnly>());
        assert!(!owned.message_type().is::<String>());
    }

    #[test]
    fn test_view_of_owned_delivery_shares_the_message() {
        let owned = Delivery::owned(MoveOnly("hello".into()));
        let addr = owned.peek().addr();

        let view = owned.as_view();
        assert!(!view.is_owned());
        assert_eq!(view.peek().addr(), addr);
        assert_eq!(view.downcast_ref::<MoveOnly>().map(|m| m.0.as_str()), Some("hello"));
    }

    #[test]
    fn test_into_owned_rejects_views_and_wrong_types() {
        let message = MoveOnly("x".into());
        let view = Delivery::view(&message);
        assert!(view.into_owned::<MoveOnly>().is_err());

        let owned = Delivery::owned(MoveOnly("y".into()));
        let owned = owned.into_owned::<String>().unwrap_err();
        assert!(owned.is_owned());
        assert_eq!(owned.into_owned::<MoveOnly>().ok().map(|m| m.0), Some("y".to_string()));
    }
}
