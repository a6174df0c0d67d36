//! Conditional dispatch over heterogeneous values
//!
//! Cascading operations (invalidation propagation, reachability walks)
//! visit structures whose members are a mix of persistent handles and plain
//! values. [`apply_if_handle`] is the filter they use: apply an operation
//! to a member only when it actually is a handle, and silently skip
//! everything else. Skipping is the defined success path, never an error.

use crate::handle::PersistentHandle;
use std::any::Any;
use std::sync::Arc;

/// Apply `f` to `value` iff it is a persistent handle
///
/// The capability test is a type test, not a name test: the value must be
/// an `Arc<PersistentHandle>`. Plain values of any other type produce
/// `None` without invoking `f`.
///
/// # Examples
///
/// ```
/// use amber_engine::cascade::apply_if_handle;
/// use amber_engine::handle::PersistentHandle;
///
/// let handle = PersistentHandle::new();
/// let visited = apply_if_handle(|h| h.status(), &handle);
/// assert!(visited.is_some());
///
/// let plain = 42i64;
/// let skipped = apply_if_handle(|h| h.status(), &plain);
/// assert!(skipped.is_none());
/// ```
pub fn apply_if_handle<R>(
    f: impl FnOnce(&Arc<PersistentHandle>) -> R,
    value: &dyn Any,
) -> Option<R> {
    value.downcast_ref::<Arc<PersistentHandle>>().map(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_core::Value;

    #[test]
    fn test_applies_to_handle() {
        let handle = PersistentHandle::new();
        handle.raw_set("name", Value::from("ada"));
        let result = apply_if_handle(|h| h.raw_get("name").unwrap(), &handle);
        assert_eq!(result, Some(Value::from("ada")));
    }

    #[test]
    fn test_skips_plain_values() {
        let mut invoked = false;
        assert!(apply_if_handle(|_| invoked = true, &7i64).is_none());
        assert!(apply_if_handle(|_| invoked = true, &"plain").is_none());
        assert!(apply_if_handle(|_| invoked = true, &String::from("plain")).is_none());
        assert!(apply_if_handle(|_| invoked = true, &Option::<i64>::None).is_none());
        assert!(apply_if_handle(|_| invoked = true, &()).is_none());
        assert!(!invoked);
    }

    #[test]
    fn test_skips_lookalike_values() {
        // A Value::Ref names a persistent object but is not a handle.
        let reference = Value::Ref(amber_core::ObjectId::new(3));
        assert!(apply_if_handle(|_| (), &reference).is_none());
    }

    #[test]
    fn test_visits_only_handles_in_mixed_structure() {
        let members: Vec<Box<dyn Any>> = vec![
            Box::new(PersistentHandle::new()),
            Box::new(5i64),
            Box::new(PersistentHandle::new()),
            Box::new("text"),
        ];
        let visited = members
            .iter()
            .filter_map(|m| apply_if_handle(|h| h.status(), m.as_ref()))
            .count();
        assert_eq!(visited, 2);
    }
}
