//! The persistence proxy
//!
//! A [`PersistentHandle`] stands in for one persistable entity. It looks
//! like a fully materialized bag of named fields, but may actually be a
//! ghost: a versioned, lazily-loaded handle into an external store. Field
//! access goes through [`get`](PersistentHandle::get) /
//! [`set`](PersistentHandle::set), which decide on every call whether to
//! trigger a state load, a staleness report, or a dirty report before
//! touching the underlying generic storage.
//!
//! ## Access protocol
//!
//! On a read of a triggering name (see [`crate::dispatch`]):
//! 1. a ghost is materialized through the owner's state loader,
//! 2. if the handle's serial differs from the owner's, the read is reported
//!    once and the handle is restamped,
//! 3. the raw field read happens last.
//!
//! On a write of a triggering name:
//! 1. a handle that has ever been saved reports the change to its owner
//!    (a failure here aborts the write),
//! 2. the raw field write happens unconditionally afterward - ghosts accept
//!    blind writes without being loaded first, since overwriting a field
//!    does not need its old value.
//!
//! Exempt names skip both sequences, which is how the load and dirty
//! machinery mutates bookkeeping entries without recursive side effects.
//!
//! ## Locking
//!
//! Metadata and fields sit behind separate `parking_lot` locks. Neither
//! lock is ever held across a [`Tracker`] call, so collaborators are free
//! to call back into the raw layer and the metadata mutators.

use crate::dispatch;
use crate::tracker::Tracker;
use amber_core::{Error, FieldMap, ObjectId, Result, Serial, Status, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

struct Meta {
    status: Status,
    serial: Serial,
    oid: Option<ObjectId>,
    owner: Option<Weak<dyn Tracker>>,
}

/// Proxy for one persistable entity
///
/// Handles are shared: the unit of work caches them, dirty registries pin
/// them, and application code clones the `Arc` freely. The back-reference
/// to the owner is weak, so a handle and its unit of work never keep each
/// other alive; a ghost whose owner has been dropped is still destructible
/// (and still writable) without ever materializing.
pub struct PersistentHandle {
    /// Self-reference for handing a strong `Arc` to collaborators.
    /// Constructors are the only way to build a handle and all of them
    /// return `Arc`, so upgrading always succeeds while `&self` exists.
    weak_self: Weak<PersistentHandle>,
    meta: RwLock<Meta>,
    fields: RwLock<FieldMap>,
}

impl PersistentHandle {
    /// Construct a fresh, never-persisted handle
    ///
    /// The handle starts `Unsaved` and detached: no identifier, no owner,
    /// serial [`Serial::UNSYNCED`]. An unsaved handle never reports dirty -
    /// there is no baseline to diverge from.
    pub fn new() -> Arc<Self> {
        Self::build(Status::Unsaved, None, None)
    }

    /// Construct a ghost bound to an owner
    ///
    /// Ghosts are only ever created already-identified and already-owned:
    /// materializing one requires both. The serial starts
    /// [`Serial::UNSYNCED`] so the first tracked access is always reported.
    pub fn ghost(owner: &Arc<dyn Tracker>, oid: ObjectId) -> Arc<Self> {
        Self::build(Status::Ghost, Some(Arc::downgrade(owner)), Some(oid))
    }

    fn build(
        status: Status,
        owner: Option<Weak<dyn Tracker>>,
        oid: Option<ObjectId>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| PersistentHandle {
            weak_self: weak_self.clone(),
            meta: RwLock::new(Meta {
                status,
                serial: Serial::UNSYNCED,
                oid,
                owner,
            }),
            fields: RwLock::new(FieldMap::new()),
        })
    }

    fn strong(&self) -> Arc<Self> {
        self.weak_self
            .upgrade()
            .expect("handles are always Arc-owned")
    }

    /// Bind a freshly persisted handle to its owner and identifier
    ///
    /// This is the `Unsaved -> Saved` transition, performed by storage
    /// machinery after the object's state has been written out. The serial
    /// is stamped with the owner's current serial: the handle is in sync
    /// with the snapshot that persisted it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` if the handle already has an owner
    /// or an identifier; both are immutable once assigned.
    pub fn attach(&self, owner: &Arc<dyn Tracker>, oid: ObjectId) -> Result<()> {
        // Ask for the serial before taking the lock: no lock is ever held
        // across a tracker call.
        let serial = owner.transaction_serial();
        let mut meta = self.meta.write();
        if meta.owner.is_some() || meta.oid.is_some() {
            return Err(Error::InvalidOperation(format!(
                "handle is already attached (oid {:?})",
                meta.oid
            )));
        }
        debug_assert_eq!(meta.status, Status::Unsaved);
        meta.owner = Some(Arc::downgrade(owner));
        meta.oid = Some(oid);
        meta.status = Status::Saved;
        meta.serial = serial;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Intercepted access
    // ------------------------------------------------------------------

    /// Read a field by name
    ///
    /// Triggering names run the full read protocol (load, staleness report)
    /// before the raw read; exempt names go straight to storage. The raw
    /// read happens either way.
    ///
    /// # Errors
    ///
    /// `InvalidFieldName` for malformed names (checked before anything
    /// else), `Load` / `AccessTracking` for collaborator failures,
    /// `FieldNotFound` when the field does not exist.
    pub fn get(&self, name: &str) -> Result<Value> {
        dispatch::validate_name(name)?;
        if !dispatch::is_protocol_exempt(name) {
            self.ensure_loaded()?;
            self.track_access()?;
        }
        self.raw_get(name)
    }

    /// Write a field by name
    ///
    /// Triggering names report the change first when the handle has ever
    /// been saved; a tracking failure aborts the write and the field keeps
    /// its prior value. The raw write itself is unconditional - ghosts
    /// accept blind writes without loading.
    ///
    /// # Errors
    ///
    /// `InvalidFieldName` for malformed names, `ChangeTracking` when the
    /// owner rejects the dirty report.
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        dispatch::validate_name(name)?;
        if !dispatch::is_protocol_exempt(name) {
            self.mark_dirty()?;
        }
        self.raw_set(name, value);
        Ok(())
    }

    /// Delete a field by name, returning its value
    ///
    /// Deleting is a modification: triggering names run the same change
    /// report as [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// `InvalidFieldName`, `ChangeTracking`, or `FieldNotFound` when the
    /// field does not exist.
    pub fn remove(&self, name: &str) -> Result<Value> {
        dispatch::validate_name(name)?;
        if !dispatch::is_protocol_exempt(name) {
            self.mark_dirty()?;
        }
        self.raw_delete(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Materialize this handle if it is a ghost
    ///
    /// Delegates to the owner's state loader. On failure the status is left
    /// exactly as the loader left it - a retry after the backend recovers
    /// goes through the same path.
    ///
    /// # Errors
    ///
    /// `Error::Load` wrapping the loader's failure, including the case
    /// where the owning unit of work no longer exists.
    pub fn ensure_loaded(&self) -> Result<()> {
        let (oid, owner) = {
            let meta = self.meta.read();
            if meta.status != Status::Ghost {
                return Ok(());
            }
            (meta.oid, meta.owner.clone())
        };
        // Ghosts are constructed identified; a missing id is API misuse.
        let oid = oid.ok_or_else(|| {
            Error::InvalidOperation("ghost handle has no object id".to_string())
        })?;
        let owner = owner.and_then(|w| w.upgrade()).ok_or_else(|| Error::Load {
            oid,
            cause: "owning unit of work no longer exists".into(),
        })?;
        owner
            .load_state(&self.strong())
            .map_err(|cause| Error::Load { oid, cause })
    }

    /// Report this handle as modified
    ///
    /// No-op for `Unsaved` handles and for handles whose owner is gone.
    /// Never changes `status`: remembering the modification is the owner's
    /// bookkeeping, not a state of the handle.
    ///
    /// # Errors
    ///
    /// `Error::ChangeTracking` wrapping the owner's failure.
    pub fn mark_dirty(&self) -> Result<()> {
        let (status, owner) = {
            let meta = self.meta.read();
            (meta.status, meta.owner.clone())
        };
        if status == Status::Unsaved {
            return Ok(());
        }
        match owner.and_then(|w| w.upgrade()) {
            Some(owner) => owner
                .note_change(&self.strong())
                .map_err(Error::ChangeTracking),
            None => Ok(()),
        }
    }

    /// Report this read to the owner when the snapshot has moved
    ///
    /// The owner restamps the handle, so the report fires at most once per
    /// snapshot.
    fn track_access(&self) -> Result<()> {
        let owner = { self.meta.read().owner.clone() };
        let Some(owner) = owner.and_then(|w| w.upgrade()) else {
            return Ok(());
        };
        if self.serial() != owner.transaction_serial() {
            owner
                .note_access(&self.strong())
                .map_err(Error::AccessTracking)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Raw accessor primitives
    // ------------------------------------------------------------------
    // These operate on the generic storage directly, bypassing the name
    // dispatch entirely. The load and dirty collaborators use them to set
    // bookkeeping entries and restore saved fields without triggering a
    // nested load or a dirty report.

    /// Read a field without interception
    ///
    /// # Errors
    ///
    /// `FieldNotFound` when the field does not exist.
    pub fn raw_get(&self, name: &str) -> Result<Value> {
        self.fields
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Write a field without interception
    pub fn raw_set(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }

    /// Probe for a field without interception
    ///
    /// Reports presence without failing on absence, and never runs the read
    /// protocol - an existence probe must not force a load.
    pub fn raw_has(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }

    /// Delete a field without interception, returning its value if present
    pub fn raw_delete(&self, name: &str) -> Option<Value> {
        self.fields.write().remove(name)
    }

    /// Drop every field without interception
    pub fn raw_clear(&self) {
        self.fields.write().clear();
    }

    // ------------------------------------------------------------------
    // State transfer
    // ------------------------------------------------------------------

    /// Snapshot the application fields for an external serializer
    ///
    /// Runs the full read protocol first (a ghost is loaded, the access is
    /// tracked), then returns a copy of every field outside the reserved
    /// metadata namespace.
    ///
    /// # Errors
    ///
    /// Same failures as a triggering read.
    pub fn state(&self) -> Result<FieldMap> {
        self.ensure_loaded()?;
        self.track_access()?;
        let fields = self.fields.read();
        Ok(fields
            .iter()
            .filter(|(name, _)| !name.starts_with(dispatch::META_PREFIX))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    /// Restore fields from a stored record, without interception
    ///
    /// The state-restoring entry point used by load collaborators. Existing
    /// fields with the same names are overwritten; others are kept.
    pub fn restore_state(&self, state: FieldMap) {
        let mut fields = self.fields.write();
        for (name, value) in state {
            fields.insert(name, value);
        }
    }

    // ------------------------------------------------------------------
    // Metadata - always exempt from interception
    // ------------------------------------------------------------------

    /// Current materialization state
    pub fn status(&self) -> Status {
        self.meta.read().status
    }

    /// Serial of the snapshot this handle last synchronized against
    pub fn serial(&self) -> Serial {
        self.meta.read().serial
    }

    /// Storage identifier, `None` until first persisted
    pub fn object_id(&self) -> Option<ObjectId> {
        self.meta.read().oid
    }

    /// The owning tracker, if attached and still alive
    pub fn owner(&self) -> Option<Arc<dyn Tracker>> {
        self.meta.read().owner.as_ref().and_then(Weak::upgrade)
    }

    /// True when fields are not materialized
    pub fn is_ghost(&self) -> bool {
        self.status() == Status::Ghost
    }

    /// True when fields are materialized and synchronized with the store
    pub fn is_saved(&self) -> bool {
        self.status() == Status::Saved
    }

    /// True when the handle has never been persisted
    pub fn is_unsaved(&self) -> bool {
        self.status() == Status::Unsaved
    }

    /// Transition to `Saved`
    ///
    /// For load and commit machinery: called after a ghost's fields have
    /// been restored, or after a handle's state has been written out.
    pub fn set_status_saved(&self) {
        self.meta.write().status = Status::Saved;
    }

    /// Stamp the handle with a snapshot serial
    ///
    /// For access-tracking machinery: a handle stamped with the owner's
    /// current serial stops reporting reads until the serial advances.
    pub fn set_serial(&self, serial: Serial) {
        self.meta.write().serial = serial;
    }
}

// Ghost-safe by construction: shows metadata only, never touches fields,
// so debugging a ghost does not materialize it.
impl fmt::Debug for PersistentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.meta.read();
        f.debug_struct("PersistentHandle")
            .field("status", &meta.status)
            .field("serial", &meta.serial)
            .field("oid", &meta.oid)
            .finish()
    }
}
