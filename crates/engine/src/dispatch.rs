//! Field-name dispatch policy
//!
//! Every named field access on a persistent handle is classified before any
//! protocol work happens: a *triggering* name is subject to lazy loading and
//! access/change tracking, an *exempt* name bypasses the protocol entirely.
//!
//! Exempt names exist so that the machinery itself can run without
//! re-entering the interception logic: state loaders write bookkeeping
//! entries under the reserved metadata prefix, and debugging or
//! state-restore tooling may probe the reserved reflective keys of a stored
//! record without forcing a ghost to materialize.
//!
//! Classification is an exact, case-sensitive prefix/string comparison.
//! There are no wildcards and no user-defined additions.

use amber_core::{Error, Result};

/// Reserved prefix for persistence-machinery bookkeeping entries
///
/// Fields whose name starts with this prefix never trigger a load, an
/// access report, or a change report.
pub const META_PREFIX: &str = "_p_";

/// Reflective record keys that are always safe to probe on a ghost
///
/// These keys come from the serialized record vocabulary: representation,
/// class identity, and the state-restore entry point. Probing them never
/// forces a load, so inspection tooling can look at an object without
/// materializing it.
pub const GHOST_SAFE_NAMES: &[&str] = &["__repr__", "__class__", "__setstate__"];

/// Returns true when `name` bypasses the interception protocol
///
/// A name is exempt iff it starts with [`META_PREFIX`] or is exactly one of
/// [`GHOST_SAFE_NAMES`]. Every other name is triggering.
pub fn is_protocol_exempt(name: &str) -> bool {
    name.starts_with(META_PREFIX) || GHOST_SAFE_NAMES.contains(&name)
}

/// Reject malformed field names before any interception logic runs
///
/// A well-formed field name is non-empty and free of control characters.
///
/// # Errors
///
/// Returns `Error::InvalidFieldName` for malformed names.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_prefix_is_exempt() {
        assert!(is_protocol_exempt("_p_status"));
        assert!(is_protocol_exempt("_p_serial"));
        assert!(is_protocol_exempt("_p_"));
        assert!(is_protocol_exempt("_p_anything_at_all"));
    }

    #[test]
    fn test_ghost_safe_names_are_exempt() {
        assert!(is_protocol_exempt("__repr__"));
        assert!(is_protocol_exempt("__class__"));
        assert!(is_protocol_exempt("__setstate__"));
    }

    #[test]
    fn test_ordinary_names_trigger() {
        assert!(!is_protocol_exempt("name"));
        assert!(!is_protocol_exempt("age"));
        assert!(!is_protocol_exempt("value"));
    }

    #[test]
    fn test_near_misses_trigger() {
        // Prefix comparison is exact: shorter or shifted prefixes don't count
        assert!(!is_protocol_exempt("_pstatus"));
        assert!(!is_protocol_exempt("_P_status"));
        assert!(!is_protocol_exempt("p_status"));
        assert!(!is_protocol_exempt("__p_status"));
        // Fixed-set comparison is exact and case-sensitive
        assert!(!is_protocol_exempt("__repr"));
        assert!(!is_protocol_exempt("__REPR__"));
        assert!(!is_protocol_exempt("__getstate__"));
        assert!(!is_protocol_exempt("__init__"));
    }

    #[test]
    fn test_underscore_only_names_trigger() {
        assert!(!is_protocol_exempt("_"));
        assert!(!is_protocol_exempt("__"));
        assert!(!is_protocol_exempt("_x"));
    }

    #[test]
    fn test_validate_accepts_ordinary_names() {
        assert!(validate_name("name").is_ok());
        assert!(validate_name("_p_serial").is_ok());
        assert!(validate_name("__repr__").is_ok());
        assert!(validate_name("field with spaces").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            validate_name(""),
            Err(amber_core::Error::InvalidFieldName(_))
        ));
    }

    #[test]
    fn test_validate_rejects_control_characters() {
        assert!(validate_name("na\0me").is_err());
        assert!(validate_name("name\n").is_err());
        assert!(validate_name("\tname").is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Classification is total and agrees with its definition for
            /// arbitrary names.
            #[test]
            fn classification_matches_definition(name in "\\PC*") {
                let expected = name.starts_with(META_PREFIX)
                    || GHOST_SAFE_NAMES.contains(&name.as_str());
                prop_assert_eq!(is_protocol_exempt(&name), expected);
            }

            /// Anything under the metadata prefix is exempt, whatever follows.
            #[test]
            fn meta_prefix_always_exempt(suffix in "\\PC*") {
                let name = format!("_p_{}", suffix);
                prop_assert!(is_protocol_exempt(&name));
            }
        }
    }
}
