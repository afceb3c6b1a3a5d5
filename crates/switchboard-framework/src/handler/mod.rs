//! Building handlers from closures.
//!
//! | constructor | closure | access |
//! |-------------|---------|--------|
//! | [`view`] | `Fn(&mut C, &M) -> R` | [`Access::View`] |
//! | [`owned`] | `Fn(&mut C, M) -> R` | [`Access::Owned`] |
//! | [`cloned`] | `Fn(&mut C, M) -> R`, `M: Clone` | [`Access::Cloned`] |
//! | [`mutable`] | `Fn(&mut C, &mut M) -> R` | [`Access::Mut`] |
//! | [`any`] | `Fn(&mut C, MessageRef<'_>) -> R` | [`Access::View`], every type |
//!
//! `R` is any [`IntoReply`](switchboard_core::IntoReply) type and decides the
//! handler's answer shape.
//!
//! [`Access::View`]: switchboard_core::Access::View
//! [`Access::Owned`]: switchboard_core::Access::Owned
//! [`Access::Cloned`]: switchboard_core::Access::Cloned
//! [`Access::Mut`]: switchboard_core::Access::Mut

mod catch_all;
mod typed;

pub use catch_all::{AnyHandler, any};
pub use typed::{ByClone, ByMut, ByRef, ByValue, FnHandler, cloned, mutable, owned, view};

use std::any::type_name;

use switchboard_core::{AnyReply, Delivery, DispatchError, DispatchResult, IntoReply, Reply};

/// Erases a closure's return value. A nested dispatch error returned by the
/// closure is surfaced as is rather than wrapped.
pub(crate) fn finish<R: IntoReply>(output: R) -> DispatchResult<AnyReply> {
    output
        .into_reply()
        .map(Reply::boxed)
        .map_err(|err| match err.downcast::<DispatchError>() {
            Ok(nested) => *nested,
            Err(other) => DispatchError::Handler(other),
        })
}

/// The error for a delivery a typed handler for `M` cannot take.
pub(crate) fn refused<M: 'static>(message: &Delivery<'_>) -> DispatchError {
    if message.message_type().is::<M>() {
        DispatchError::Misrouted {
            expected: type_name::<M>(),
            found: "a shared view".to_string(),
        }
    } else {
        DispatchError::NoMatchingHandler {
            message: message.message_type().name(),
        }
    }
}
