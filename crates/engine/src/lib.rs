//! The Amber persistence proxy engine
//!
//! This crate implements the transparent persistence protocol on top of
//! `amber-core`:
//! - PersistentHandle: the proxy that intercepts field access to enforce
//!   lazy loading and dirty tracking
//! - dispatch: the field-name policy deciding which names bypass the
//!   protocol
//! - Tracker: the seam between a handle and its owning context
//! - UnitOfWork: the transaction-scoped owner of a set of handles
//! - cascade: conditional dispatch over heterogeneous structures
//! - ComputedValue: invalidation-aware cached values
//!
//! # Quick start
//!
//! ```
//! use amber_core::{FieldMap, ObjectId, Result, StateSource, Value};
//! use amber_engine::unit_of_work::UnitOfWork;
//! use std::sync::Arc;
//!
//! struct Fixture;
//!
//! impl StateSource for Fixture {
//!     fn load(&self, _oid: ObjectId) -> Result<FieldMap> {
//!         Ok(FieldMap::from([("name".to_string(), Value::from("ada"))]))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let uow = UnitOfWork::new(Arc::new(Fixture));
//! let person = uow.resolve(ObjectId::new(1)); // a ghost: nothing loaded yet
//! assert!(person.is_ghost());
//!
//! let name = person.get("name")?; // first read materializes the object
//! assert_eq!(name, Value::from("ada"));
//! assert!(person.is_saved());
//!
//! person.set("name", Value::from("lovelace"))?; // reported to the unit of work
//! assert!(uow.is_dirty(ObjectId::new(1)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cascade;
pub mod computed;
pub mod dispatch;
pub mod handle;
pub mod tracker;
pub mod unit_of_work;

// Re-export the public surface
pub use cascade::apply_if_handle;
pub use computed::ComputedValue;
pub use dispatch::{is_protocol_exempt, validate_name, GHOST_SAFE_NAMES, META_PREFIX};
pub use handle::PersistentHandle;
pub use tracker::{Tracker, TrackerResult};
pub use unit_of_work::{UnitOfWork, UnitOfWorkConfig};
