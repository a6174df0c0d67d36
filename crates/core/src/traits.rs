//! Storage boundary for the Amber persistence core
//!
//! The core never fetches or decodes bytes itself. Everything it needs from
//! a storage backend is captured by the `StateSource` trait: given an
//! identifier, hand back the decoded field map for that object. Encoding,
//! identifier allocation, and commit protocols all live behind this
//! boundary.

use crate::error::Result;
use crate::types::ObjectId;
use crate::value::FieldMap;

/// Storage abstraction consumed by the unit of work
///
/// Implementations are expected to be swappable (in-memory fixtures, file
/// stores, remote stores) without touching the proxy protocol. Calls are
/// synchronous; a backend that performs I/O simply blocks the caller.
///
/// Thread safety: a source may be shared by several units of work, so
/// implementations must be `Send + Sync`.
pub trait StateSource: Send + Sync {
    /// Fetch the decoded field map for `oid`
    ///
    /// # Errors
    ///
    /// Returns `Error::RecordMissing` when the backend has no record for the
    /// identifier, or `Error::Storage` (or any other variant) for backend
    /// failures. The unit of work reports either as a load failure and
    /// preserves it as the cause.
    fn load(&self, oid: ObjectId) -> Result<FieldMap>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::Value;
    use std::collections::HashMap;

    struct SingleRecord;

    impl StateSource for SingleRecord {
        fn load(&self, oid: ObjectId) -> Result<FieldMap> {
            if oid == ObjectId::new(1) {
                Ok(HashMap::from([("name".to_string(), Value::from("ada"))]))
            } else {
                Err(Error::RecordMissing(oid))
            }
        }
    }

    #[test]
    fn test_source_as_trait_object() {
        let source: Box<dyn StateSource> = Box::new(SingleRecord);
        let state = source.load(ObjectId::new(1)).unwrap();
        assert_eq!(state.get("name"), Some(&Value::from("ada")));
        assert!(matches!(
            source.load(ObjectId::new(2)),
            Err(Error::RecordMissing(_))
        ));
    }
}
