//! Reply shapes.
//!
//! A handler answers with one of three shapes:
//!
//! - **Empty**: side effects only, no answer.
//! - **Soft**: an answer that may be absent; a later handler may supply one.
//! - **Hard**: a final answer; nothing after it runs.
//!
//! Typed handlers declare their shape through their return type, see
//! [`IntoReply`].

use std::any::Any;

use crate::error::BoxError;
use crate::message::MessageType;

/// The declared shape of a handler's answer.
///
/// Shapes are ordered `Empty < Soft < Hard`; merging shapes takes the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Shape {
    /// No answer, side effects only.
    Empty,
    /// A maybe-present answer.
    Soft,
    /// An unconditional answer.
    Hard,
}

impl Shape {
    /// Merges two declared shapes.
    pub fn merge(self, other: Shape) -> Shape {
        self.max(other)
    }

    /// Wraps a definite value in this shape.
    ///
    /// An `Empty` shape has no place for a value and drops it.
    pub fn answer<T>(self, value: T) -> Reply<T> {
        match self {
            Shape::Empty => Reply::Empty,
            Shape::Soft => Reply::Soft(Some(value)),
            Shape::Hard => Reply::Hard(value),
        }
    }

    /// The reply of this shape when nothing answered, if it has one.
    ///
    /// `Hard` has no absent form.
    pub fn absent<T>(self) -> Option<Reply<T>> {
        match self {
            Shape::Empty => Some(Reply::Empty),
            Shape::Soft => Some(Reply::Soft(None)),
            Shape::Hard => None,
        }
    }
}

/// The answer produced by a handler or router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// No answer.
    Empty,
    /// A maybe-present answer.
    Soft(Option<T>),
    /// A final answer.
    Hard(T),
}

/// A reply whose value type has been erased.
pub type AnyReply = Reply<Box<dyn Any + Send>>;

impl<T> Reply<T> {
    /// Returns the shape of this reply.
    pub fn shape(&self) -> Shape {
        match self {
            Reply::Empty => Shape::Empty,
            Reply::Soft(_) => Shape::Soft,
            Reply::Hard(_) => Shape::Hard,
        }
    }

    /// Returns `true` if this reply carries a value.
    pub fn is_definite(&self) -> bool {
        matches!(self, Reply::Soft(Some(_)) | Reply::Hard(_))
    }

    /// Returns the carried value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Reply::Empty | Reply::Soft(None) => None,
            Reply::Soft(Some(value)) | Reply::Hard(value) => Some(value),
        }
    }

    /// Maps the carried value, keeping the shape.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Empty => Reply::Empty,
            Reply::Soft(value) => Reply::Soft(value.map(f)),
            Reply::Hard(value) => Reply::Hard(f(value)),
        }
    }
}

impl<T: Any + Send> Reply<T> {
    /// Erases the value type.
    pub fn boxed(self) -> AnyReply {
        self.map(|value| Box::new(value) as Box<dyn Any + Send>)
    }
}

impl AnyReply {
    /// Recovers a typed reply.
    ///
    /// Replies without a value convert to any `T`. On a type mismatch the
    /// reply is returned unchanged.
    pub fn downcast<T: Any>(self) -> Result<Reply<T>, Self> {
        match self {
            Reply::Empty => Ok(Reply::Empty),
            Reply::Soft(None) => Ok(Reply::Soft(None)),
            Reply::Soft(Some(value)) => value
                .downcast::<T>()
                .map(|v| Reply::Soft(Some(*v)))
                .map_err(|value| Reply::Soft(Some(value))),
            Reply::Hard(value) => value
                .downcast::<T>()
                .map(|v| Reply::Hard(*v))
                .map_err(Reply::Hard),
        }
    }
}

/// Marks a handler's return value as a final answer.
///
/// ```rust,ignore
/// let lookup = view(|_: &mut State, key: &Key| Hard(key.0 * 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hard<T>(pub T);

/// Return types a typed handler may have.
///
/// | return type | shape |
/// |-------------|-------|
/// | `()` | `Empty` |
/// | `Option<T>` | `Soft` |
/// | `Hard<T>` | `Hard` |
/// | `Result<R, E>` | shape of `R`, `E` reported as a handler failure |
pub trait IntoReply {
    /// The answer's value type.
    type Value: Any + Send;

    /// The declared shape.
    const SHAPE: Shape;

    /// Converts the return value into a reply.
    fn into_reply(self) -> Result<Reply<Self::Value>, BoxError>;

    /// The declared reply value type; `None` for `Empty`.
    fn reply_type() -> Option<MessageType> {
        match Self::SHAPE {
            Shape::Empty => None,
            Shape::Soft | Shape::Hard => Some(MessageType::of::<Self::Value>()),
        }
    }
}

impl IntoReply for () {
    type Value = ();
    const SHAPE: Shape = Shape::Empty;

    fn into_reply(self) -> Result<Reply<()>, BoxError> {
        Ok(Reply::Empty)
    }
}

impl<T: Any + Send> IntoReply for Option<T> {
    type Value = T;
    const SHAPE: Shape = Shape::Soft;

    fn into_reply(self) -> Result<Reply<T>, BoxError> {
        Ok(Reply::Soft(self))
    }
}

impl<T: Any + Send> IntoReply for Hard<T> {
    type Value = T;
    const SHAPE: Shape = Shape::Hard;

    fn into_reply(self) -> Result<Reply<T>, BoxError> {
        Ok(Reply::Hard(self.0))
    }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<BoxError>,
{
    type Value = R::Value;
    const SHAPE: Shape = R::SHAPE;

    fn into_reply(self) -> Result<Reply<R::Value>, BoxError> {
        self.map_err(Into::into).and_then(IntoReply::into_reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_merge_takes_the_strongest() {
        assert_eq!(Shape::Empty.merge(Shape::Soft), Shape::Soft);
        assert_eq!(Shape::Hard.merge(Shape::Soft), Shape::Hard);
        assert_eq!(Shape::Empty.merge(Shape::Empty), Shape::Empty);
    }

    #[test]
    fn test_declared_shapes_follow_return_types() {
        assert_eq!(<() as IntoReply>::SHAPE, Shape::Empty);
        assert_eq!(<Option<i32> as IntoReply>::SHAPE, Shape::Soft);
        assert_eq!(<Hard<i32> as IntoReply>::SHAPE, Shape::Hard);
        assert_eq!(<Result<Hard<i32>, String> as IntoReply>::SHAPE, Shape::Hard);

        assert_eq!(<() as IntoReply>::reply_type(), None);
        assert_eq!(
            <Option<i32> as IntoReply>::reply_type(),
            Some(MessageType::of::<i32>())
        );
    }

    #[test]
    fn test_result_error_becomes_failure() {
        let failed: Result<Hard<i32>, &str> = Err("boom");
        let err = failed.into_reply().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_downcast_round_trip() {
        let reply = Reply::Hard(7_i32).boxed();
        assert_eq!(reply.downcast::<i32>().unwrap(), Reply::Hard(7));

        let reply = Reply::Soft(Some("x".to_string())).boxed();
        let reply = reply.downcast::<i32>().unwrap_err();
        assert_eq!(reply.shape(), Shape::Soft);

        assert_eq!(
            Reply::<u8>::Empty.boxed().downcast::<String>().unwrap(),
            Reply::Empty
        );
    }

    #[test]
    fn test_answer_and_absent() {
        assert_eq!(Shape::Soft.answer(1), Reply::Soft(Some(1)));
        assert_eq!(Shape::Hard.answer(1), Reply::Hard(1));
        assert_eq!(Shape::Soft.absent::<i32>(), Some(Reply::Soft(None)));
        assert_eq!(Shape::Hard.absent::<i32>(), None);
    }
}
