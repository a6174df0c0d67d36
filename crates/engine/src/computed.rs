//! Cached values derived from other persistent objects
//!
//! A [`ComputedValue`] has no state of its own worth storing: its value is
//! computed from other persistent objects and merely cached. It still rides
//! on a persistent handle, because that gives it an identity inside the
//! owning unit of work - when the cached value becomes invalid in one
//! context, marking the handle dirty is what propagates the invalidation
//! to every other context at the next transaction boundary.
//!
//! All cache traffic goes through the raw layer: filling or reading the
//! cache is not a modification of the object and must never force a load
//! or a dirty report.

use crate::handle::PersistentHandle;
use amber_core::{Result, Value};
use std::sync::Arc;

/// Name of the single cached field
const CACHE_FIELD: &str = "cached";

/// A lazily computed, invalidation-aware cached value
pub struct ComputedValue {
    handle: Arc<PersistentHandle>,
}

impl ComputedValue {
    /// Wrap a handle as a computed-value cache
    ///
    /// The handle is typically freshly constructed and attached by the
    /// caller; the wrapper takes no position on ownership or identity.
    pub fn new(handle: Arc<PersistentHandle>) -> Self {
        ComputedValue { handle }
    }

    /// The underlying handle
    pub fn handle(&self) -> &Arc<PersistentHandle> {
        &self.handle
    }

    /// Return the cached value, computing and caching it if absent
    ///
    /// `compute` runs only on a cache miss. The fill is deliberately not a
    /// modification: a recomputed cache is the same logical value, so
    /// nothing is reported to the owner.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> Value) -> Value {
        if let Ok(value) = self.handle.raw_get(CACHE_FIELD) {
            return value;
        }
        let value = compute();
        self.handle.raw_set(CACHE_FIELD, value.clone());
        value
    }

    /// Forget the cached value and mark the object as modified
    ///
    /// Marking dirty is what makes the invalidation visible beyond this
    /// unit of work: the owning transaction will broadcast it, and other
    /// contexts drop their cached value in turn.
    ///
    /// # Errors
    ///
    /// `Error::ChangeTracking` when the owner rejects the dirty report; the
    /// cache is already cleared locally by then.
    pub fn invalidate(&self) -> Result<()> {
        self.handle.raw_clear();
        self.handle.mark_dirty()
    }
}
