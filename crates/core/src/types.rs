//! Core identity types for Amber
//!
//! This module defines the foundational types:
//! - ObjectId: Storage-assigned identifier for a persistent object
//! - Serial: Transaction-snapshot stamp, compared for equality only
//! - Status: Materialization state of a persistent handle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned identifier for a persistent object
///
/// An ObjectId wraps the 64-bit identifier allocated by the storage backend
/// when an object is first persisted. It is opaque to the core: the core
/// never allocates, orders, or interprets identifiers, it only carries them
/// between the handle and the storage boundary.
///
/// An identifier is immutable once assigned to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wrap a raw identifier produced by the storage backend
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ObjectId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Transaction-snapshot stamp
///
/// A Serial identifies the transaction snapshot a handle was last
/// synchronized against. The only operation the protocol performs on two
/// serials is an equality check ("has the snapshot moved since this handle
/// last reported?"), so Serial deliberately does not implement `Ord`.
///
/// A fresh handle carries `Serial::UNSYNCED` (0) and a fresh unit of work
/// starts at serial 1, which guarantees the first tracked access of every
/// handle is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Serial(u64);

impl Serial {
    /// The stamp carried by a handle that has never been access-tracked
    pub const UNSYNCED: Serial = Serial(0);

    /// Wrap a raw serial value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw serial value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The serial that follows this one
    ///
    /// Used by the unit of work when the surrounding transaction machinery
    /// declares a new snapshot. Equality is still the only comparison the
    /// protocol performs.
    pub fn next(&self) -> Serial {
        Serial(self.0 + 1)
    }
}

impl Default for Serial {
    fn default() -> Self {
        Serial::UNSYNCED
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Materialization state of a persistent handle
///
/// State transitions:
/// - `Unsaved` is the initial state of every freshly constructed handle.
/// - `Unsaved -> Saved` happens when the handle is attached to a store.
/// - `Ghost -> Saved` happens when the state loader materializes the fields.
/// - Ghosts are only created already-bound to a unit of work.
///
/// There is no `Saved -> Ghost` transition in this core; eviction back to
/// ghost belongs to an external cache manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Fields are present but have never been persisted
    Unsaved,
    /// Fields are present and synchronized with the store
    Saved,
    /// Fields are not materialized; a state load is required before reads
    Ghost,
}

impl Status {
    /// Short lowercase name, used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unsaved => "unsaved",
            Status::Saved => "saved",
            Status::Ghost => "ghost",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
