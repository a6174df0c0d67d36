//! Error types for the Amber persistence core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Collaborator failures (state loading, access tracking, change tracking)
//! keep their original cause as a boxed `source`, so calling code can match
//! on the kind (e.g. retry on `Load`) while diagnostics retain the backend
//! detail. The core never swallows a collaborator failure and never rolls
//! back partial state on its own.

use crate::types::ObjectId;
use thiserror::Error;

/// Result type alias for Amber operations
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque collaborator failure cause, preserved as an error source
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for the Amber persistence core
#[derive(Debug, Error)]
pub enum Error {
    /// Field name rejected before any interception logic ran
    #[error("invalid field name {0:?}")]
    InvalidFieldName(String),

    /// The generic field storage has no field with this name
    #[error("no field named {0:?}")]
    FieldNotFound(String),

    /// The state loader failed to materialize a ghost
    #[error("failed to load state for object {oid}")]
    Load {
        /// Identifier of the object whose load failed
        oid: ObjectId,
        /// Underlying collaborator failure
        #[source]
        cause: Cause,
    },

    /// The unit of work failed while recording a read
    #[error("access tracking failed")]
    AccessTracking(#[source] Cause),

    /// The unit of work failed while recording a modification
    #[error("change tracking failed")]
    ChangeTracking(#[source] Cause),

    /// The storage backend has no record for this identifier
    ///
    /// A ghost can outlive its stored record, e.g. when the store is packed
    /// between adoption and first load.
    #[error("no stored record for object {0}")]
    RecordMissing(ObjectId),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid operation or state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_field_name() {
        let err = Error::InvalidFieldName("".to_string());
        assert!(err.to_string().contains("invalid field name"));
    }

    #[test]
    fn test_error_display_field_not_found() {
        let err = Error::FieldNotFound("age".to_string());
        let msg = err.to_string();
        assert!(msg.contains("no field named"));
        assert!(msg.contains("age"));
    }

    #[test]
    fn test_error_display_load_with_cause() {
        let err = Error::Load {
            oid: ObjectId::new(7),
            cause: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to load state"));
        assert!(msg.contains('7'));
        // Cause is preserved as the source, not flattened into the message
        let source = std::error::Error::source(&err).expect("cause preserved");
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_display_access_tracking() {
        let err = Error::AccessTracking("tracker offline".into());
        assert!(err.to_string().contains("access tracking failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_display_change_tracking() {
        let err = Error::ChangeTracking("tracker offline".into());
        assert!(err.to_string().contains("change tracking failed"));
    }

    #[test]
    fn test_error_display_record_missing() {
        let err = Error::RecordMissing(ObjectId::new(3));
        let msg = err.to_string();
        assert!(msg.contains("no stored record"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("disk full".to_string());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_display_invalid_operation() {
        let err = Error::InvalidOperation("handle already attached".to_string());
        assert!(err.to_string().contains("handle already attached"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_load_error_boxes_as_cause() {
        // A nested Error can itself be the cause of a Load failure
        let inner = Error::RecordMissing(ObjectId::new(9));
        let outer = Error::Load {
            oid: ObjectId::new(9),
            cause: Box::new(inner),
        };
        let source = std::error::Error::source(&outer).unwrap();
        assert!(source.to_string().contains("no stored record"));
    }
}
