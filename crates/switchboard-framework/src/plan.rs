//! Per-message-type plans cached by the static routers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use switchboard_core::{CapabilityViolation, MessageType};

/// A cache of validated plans, one per message type.
///
/// Only successful plans are stored; an invalid composition is reported again
/// on every dispatch of that type.
pub(crate) struct PlanCache<P> {
    plans: RwLock<HashMap<MessageType, Arc<P>>>,
}

impl<P> Default for PlanCache<P> {
    fn default() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }
}

impl<P> PlanCache<P> {
    pub(crate) fn get_or_try_insert(
        &self,
        ty: MessageType,
        plan: impl FnOnce() -> Result<P, CapabilityViolation>,
    ) -> Result<Arc<P>, CapabilityViolation> {
        if let Some(found) = self.plans.read().get(&ty) {
            return Ok(Arc::clone(found));
        }
        let planned = Arc::new(plan()?);
        Ok(Arc::clone(
            self.plans.write().entry(ty).or_insert(planned),
        ))
    }

    pub(crate) fn len(&self) -> usize {
        self.plans.read().len()
    }
}

/// Collects the distinct message types declared by `types`, keeping first-seen order.
pub(crate) fn declared_types<I>(types: I) -> Vec<MessageType>
where
    I: IntoIterator<Item = MessageType>,
{
    let mut out: Vec<MessageType> = Vec::new();
    for ty in types {
        if !out.contains(&ty) {
            out.push(ty);
        }
    }
    out
}
