//! The tracker seam between a handle and its owning context
//!
//! A persistent handle never talks to storage or to transaction bookkeeping
//! directly. Everything it needs from its owner is captured by the
//! [`Tracker`] trait: the current transaction serial, a way to materialize a
//! ghost, and the two one-way notifications (access, change).
//!
//! [`UnitOfWork`](crate::unit_of_work::UnitOfWork) is the production
//! implementation. Alternate implementations (instrumented spies, adapters
//! onto foreign transaction systems) are first-class: a handle binds to
//! `Arc<dyn Tracker>` and holds only a weak reference, so the relation is
//! non-owning in both directions.

use crate::handle::PersistentHandle;
use amber_core::{Cause, Serial};
use std::sync::Arc;

/// Result type for tracker collaborator calls
///
/// Trackers report failures as opaque causes; the handle wraps them into
/// the error kind that matches the operation in flight (`Load`,
/// `AccessTracking`, `ChangeTracking`), so the cause survives unchanged.
pub type TrackerResult = std::result::Result<(), Cause>;

/// Transaction-scoped owner of a set of persistent handles
///
/// The methods mirror the three moments the interception protocol reaches
/// out of a handle:
///
/// - a triggering read on a ghost needs its state loaded,
/// - a triggering read on a handle with a stale serial is reported once,
/// - a triggering write on a previously-saved handle is reported on every
///   write.
///
/// All calls are synchronous and non-reentrant with respect to the handle's
/// metadata: the handle never holds its own locks while calling in here.
pub trait Tracker: Send + Sync {
    /// The serial of the transaction snapshot currently in effect
    ///
    /// Compared by the handle for equality only.
    fn transaction_serial(&self) -> Serial;

    /// Materialize the fields of a ghost handle
    ///
    /// Implementations restore the stored record through the handle's raw
    /// layer ([`PersistentHandle::restore_state`]) and transition the handle
    /// away from ghost on success. On failure the handle's status must be
    /// left exactly as this call left it; the handle does not repair it.
    fn load_state(&self, handle: &Arc<PersistentHandle>) -> TrackerResult;

    /// Record that `handle` was read under the current snapshot
    ///
    /// Called at most once per snapshot per handle: implementations stamp
    /// the handle with the current serial, which suppresses further reports
    /// until the serial advances.
    fn note_access(&self, handle: &Arc<PersistentHandle>) -> TrackerResult;

    /// Record that `handle` was modified
    ///
    /// One-way notification; remembering the handle until commit is the
    /// implementation's responsibility. This call never alters the handle's
    /// status.
    fn note_change(&self, handle: &Arc<PersistentHandle>) -> TrackerResult;
}
