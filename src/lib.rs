//! Amber - embedded object-persistence core
//!
//! Amber gives an application transparent, versioned handles into an
//! external object store. A handle pretends to be a fully materialized bag
//! of named fields while actually being a lazily-loaded ghost; reads and
//! writes are transparently reported to the owning unit of work so the
//! surrounding transaction machinery can detect staleness and remember
//! dirty objects.
//!
//! # Quick start
//!
//! ```
//! use amberdb::{FieldMap, ObjectId, Result, StateSource, UnitOfWork, Value};
//! use std::sync::Arc;
//!
//! struct Fixture;
//!
//! impl StateSource for Fixture {
//!     fn load(&self, _oid: ObjectId) -> Result<FieldMap> {
//!         Ok(FieldMap::from([("balance".to_string(), Value::Int(100))]))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let uow = UnitOfWork::new(Arc::new(Fixture));
//! let account = uow.resolve(ObjectId::new(1));
//! assert_eq!(account.get("balance")?, Value::Int(100));
//! account.set("balance", Value::Int(90))?;
//! assert!(uow.is_dirty(ObjectId::new(1)));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The protocol core lives in two crates:
//! - `amber-core`: identity types, the generic field value model, the
//!   error hierarchy, and the storage boundary (`StateSource`)
//! - `amber-engine`: the persistence proxy (`PersistentHandle`), the
//!   field-name dispatch policy, the `Tracker` seam, and the concrete
//!   `UnitOfWork`
//!
//! Storage encoding, commit/abort protocols, and conflict resolution live
//! behind the `StateSource` boundary and the unit of work's drain surface
//! (`take_changed`, `was_accessed`), outside this facade.

// Re-export the public API
pub use amber_core::{Cause, Error, FieldMap, ObjectId, Result, Serial, StateSource, Status, Value};
pub use amber_engine::{
    apply_if_handle, is_protocol_exempt, ComputedValue, PersistentHandle, Tracker, TrackerResult,
    UnitOfWork, UnitOfWorkConfig,
};
