//! The transaction-scoped unit of work
//!
//! A [`UnitOfWork`] owns the lifecycle of a set of persistent handles for
//! one logical thread of control: it adopts ghosts for stored identifiers,
//! materializes them on demand through a pluggable [`StateSource`], stamps
//! and pins handles as reads are reported, and remembers modified handles
//! until the surrounding transaction machinery drains them.
//!
//! The unit of work exposes a monotonically advancing transaction serial.
//! Advancing it is *not* this type's decision - the surrounding commit or
//! abort machinery calls [`advance_serial`](UnitOfWork::advance_serial)
//! when a new snapshot takes effect. The serial is only ever compared for
//! equality by handles deciding whether to report a read.
//!
//! ## Reference shape
//!
//! Handles hold a weak reference to their unit of work; the unit of work's
//! object cache holds weak references to handles. Only the dirty registry
//! and the recently-accessed pin set hold strong references, and both are
//! drained at transaction boundaries - so neither side of the
//! handle/unit-of-work relation keeps the other alive, and ghosts die
//! without ever being materialized.

use crate::handle::PersistentHandle;
use crate::tracker::{Tracker, TrackerResult};
use amber_core::{Cause, Error, ObjectId, Result, Serial, StateSource, Status};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Default initial capacity of the object cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Default number of cache insertions between dead-entry sweeps
pub const DEFAULT_SWEEP_INTERVAL: usize = 256;

/// Tuning knobs for a unit of work
#[derive(Debug, Clone)]
pub struct UnitOfWorkConfig {
    /// Initial capacity of the object cache
    pub cache_capacity: usize,
    /// Cache insertions between sweeps of dead weak entries
    pub sweep_interval: usize,
}

impl Default for UnitOfWorkConfig {
    fn default() -> Self {
        UnitOfWorkConfig {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Transaction-scoped context owning a set of persistent handles
pub struct UnitOfWork {
    /// Self-reference handed to handles as their (weak) owner.
    /// Construction always goes through `Arc::new_cyclic`, so upgrading
    /// succeeds while `&self` exists.
    weak_self: Weak<UnitOfWork>,
    source: Arc<dyn StateSource>,
    /// Current transaction serial; starts at 1 so fresh handles
    /// (stamped 0) always report their first tracked access.
    serial: AtomicU64,
    /// Weak handle cache: one live handle per identifier
    cache: DashMap<ObjectId, Weak<PersistentHandle>>,
    /// Handles reported as modified, held strongly until drained
    changed: DashMap<ObjectId, Arc<PersistentHandle>>,
    /// Handles read under the current serial, pinned until it advances
    recent: DashMap<ObjectId, Arc<PersistentHandle>>,
    inserts_since_sweep: AtomicUsize,
    sweep_interval: usize,
}

impl UnitOfWork {
    /// Create a unit of work over a storage boundary with default tuning
    pub fn new(source: Arc<dyn StateSource>) -> Arc<Self> {
        Self::with_config(source, UnitOfWorkConfig::default())
    }

    /// Create a unit of work with explicit tuning
    pub fn with_config(source: Arc<dyn StateSource>, config: UnitOfWorkConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| UnitOfWork {
            weak_self: weak_self.clone(),
            source,
            serial: AtomicU64::new(1),
            cache: DashMap::with_capacity(config.cache_capacity),
            changed: DashMap::new(),
            recent: DashMap::new(),
            inserts_since_sweep: AtomicUsize::new(0),
            sweep_interval: config.sweep_interval.max(1),
        })
    }

    fn as_tracker(&self) -> Arc<dyn Tracker> {
        self.weak_self
            .upgrade()
            .expect("units of work are always Arc-owned")
    }

    /// Serial of the snapshot currently in effect
    pub fn serial(&self) -> Serial {
        Serial::new(self.serial.load(Ordering::SeqCst))
    }

    /// Move to the next snapshot serial
    ///
    /// Called by the surrounding transaction machinery at commit/abort
    /// boundaries. Handles stamped with the previous serial become stale
    /// and will report their next read; the recently-accessed pin set is
    /// released.
    pub fn advance_serial(&self) -> Serial {
        let raw = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        self.recent.clear();
        debug!(serial = raw, "advanced transaction serial");
        Serial::new(raw)
    }

    /// Handle for `oid`: the cached one while alive, else a fresh ghost
    ///
    /// The cache guarantees one live handle per identifier, so object
    /// identity follows storage identity within a unit of work.
    pub fn resolve(&self, oid: ObjectId) -> Arc<PersistentHandle> {
        use dashmap::mapref::entry::Entry;
        // The sweep must run after the entry guard is released: retain
        // takes every shard lock, and the guard already holds one.
        let handle = match self.cache.entry(oid) {
            Entry::Occupied(mut entry) => match entry.get().upgrade() {
                Some(handle) => return handle,
                None => {
                    let handle = self.new_ghost(oid);
                    entry.insert(Arc::downgrade(&handle));
                    handle
                }
            },
            Entry::Vacant(entry) => {
                let handle = self.new_ghost(oid);
                entry.insert(Arc::downgrade(&handle));
                handle
            }
        };
        self.note_cache_insert();
        handle
    }

    /// Cached handle for `oid`, if one is still alive
    pub fn cached(&self, oid: ObjectId) -> Option<Arc<PersistentHandle>> {
        self.cache.get(&oid).and_then(|entry| entry.upgrade())
    }

    /// Bind a freshly persisted handle to this unit of work
    ///
    /// Storage machinery calls this after writing an unsaved handle's state
    /// out for the first time: the handle becomes `Saved`, synchronized
    /// with the current snapshot, and resolvable through the cache.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOperation` if the identifier already names a live
    /// handle, or if the handle is already attached.
    pub fn attach(&self, handle: &Arc<PersistentHandle>, oid: ObjectId) -> Result<()> {
        if self.cached(oid).is_some() {
            return Err(Error::InvalidOperation(format!(
                "object id {oid} already names a live handle"
            )));
        }
        handle.attach(&self.as_tracker(), oid)?;
        self.cache.insert(oid, Arc::downgrade(handle));
        self.note_cache_insert();
        Ok(())
    }

    /// Handles reported as modified since the last drain
    pub fn changed(&self) -> Vec<Arc<PersistentHandle>> {
        self.changed.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Drain the modified set, handing it to commit/abort machinery
    pub fn take_changed(&self) -> Vec<Arc<PersistentHandle>> {
        let drained = self.changed();
        self.changed.clear();
        drained
    }

    /// True when `oid` was reported as modified and not yet drained
    pub fn is_dirty(&self, oid: ObjectId) -> bool {
        self.changed.contains_key(&oid)
    }

    /// True when `oid` was read under the current snapshot serial
    pub fn was_accessed(&self, oid: ObjectId) -> bool {
        self.recent.contains_key(&oid)
    }

    /// Number of identifiers currently in the object cache
    ///
    /// Includes entries whose handle has died but has not been swept yet.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn new_ghost(&self, oid: ObjectId) -> Arc<PersistentHandle> {
        PersistentHandle::ghost(&self.as_tracker(), oid)
    }

    /// Periodically drop cache entries whose handle has died
    fn note_cache_insert(&self) {
        let inserts = self.inserts_since_sweep.fetch_add(1, Ordering::SeqCst) + 1;
        if inserts >= self.sweep_interval {
            self.inserts_since_sweep.store(0, Ordering::SeqCst);
            let before = self.cache.len();
            self.cache.retain(|_, weak| weak.strong_count() > 0);
            trace!(swept = before - self.cache.len(), "swept dead cache entries");
        }
    }
}

impl Tracker for UnitOfWork {
    fn transaction_serial(&self) -> Serial {
        self.serial()
    }

    fn load_state(&self, handle: &Arc<PersistentHandle>) -> TrackerResult {
        let Some(oid) = handle.object_id() else {
            return Err(Cause::from(Error::InvalidOperation(
                "cannot load a handle with no object id".to_string(),
            )));
        };
        if handle.status() != Status::Ghost {
            return Err(Cause::from(Error::InvalidOperation(format!(
                "object {oid} is not a ghost"
            ))));
        }
        let state = self.source.load(oid).map_err(Cause::from)?;
        handle.restore_state(state);
        handle.set_status_saved();
        debug!(%oid, "materialized object state");
        Ok(())
    }

    fn note_access(&self, handle: &Arc<PersistentHandle>) -> TrackerResult {
        handle.set_serial(self.serial());
        if let Some(oid) = handle.object_id() {
            self.recent.insert(oid, Arc::clone(handle));
        }
        Ok(())
    }

    fn note_change(&self, handle: &Arc<PersistentHandle>) -> TrackerResult {
        if let Some(oid) = handle.object_id() {
            trace!(%oid, "recorded modification");
            self.changed.insert(oid, Arc::clone(handle));
        }
        Ok(())
    }
}
