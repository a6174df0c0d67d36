//! Core types and traits for Amber
//!
//! This crate defines the foundational types used throughout the system:
//! - ObjectId: storage-assigned identifier for a persistent object
//! - Serial: transaction-snapshot stamp, compared for equality only
//! - Status: materialization state of a persistent handle
//! - Value / FieldMap: the generic field storage model
//! - Error: error type hierarchy
//! - StateSource: the storage boundary consumed by the unit of work

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Cause, Error, Result};
pub use traits::StateSource;
pub use types::{ObjectId, Serial, Status};
pub use value::{FieldMap, Value};
