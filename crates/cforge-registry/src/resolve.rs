//! # Reference Resolution
//!
//! Turns `$ref` strings into long names and recovers the item type of a
//! generic collection from its own long name.
//!
//! Some exporters emit collections whose `items.type.$ref` points back at
//! the collection itself (`Vec<String>` referencing `Vec<String>`). Following
//! that reference would loop forever, so the item type is read out of the
//! generic arguments instead:
//!
//! | container           | item |
//! |---------------------|------|
//! | `Vec<T>`            | `T`  |
//! | `SmallVec<[T; N]>`  | `T`  |
//! | `HashSet<T>`        | `T`  |
//! | `BTreeSet<T>`       | `T`  |
//!
//! Any module path prefix is accepted, and trailing generic parameters
//! (allocators, hashers) are ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::definition::{TypeDefinition, DEFS_REF_PREFIX};
use crate::error::CompileError;

/// Known generic containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape {
    Vec,
    SmallVec,
    HashSet,
    BTreeSet,
}

static CONTAINER_PATTERNS: LazyLock<Vec<(ContainerShape, Regex)>> = LazyLock::new(|| {
    [
        (ContainerShape::Vec, r"^(?:\w+::)*Vec<(?P<args>.+)>$"),
        (ContainerShape::SmallVec, r"^(?:\w+::)*SmallVec<\[(?P<args>.+);\s*\d+\]>$"),
        (ContainerShape::HashSet, r"^(?:\w+::)*HashSet<(?P<args>.+)>$"),
        (ContainerShape::BTreeSet, r"^(?:\w+::)*BTreeSet<(?P<args>.+)>$"),
    ]
    .into_iter()
    .map(|(shape, pattern)| {
        (shape, Regex::new(pattern).expect("container patterns are valid regexes"))
    })
    .collect()
});

/// Strip the `#/$defs/` prefix from a reference.
pub fn ref_name(reference: &str) -> &str {
    reference.strip_prefix(DEFS_REF_PREFIX).unwrap_or(reference)
}

/// Match a long name against the known container patterns.
pub fn container_shape(long_name: &str) -> Option<(ContainerShape, String)> {
    CONTAINER_PATTERNS.iter().find_map(|(shape, pattern)| {
        let captures = pattern.captures(long_name)?;
        let args = captures.name("args")?.as_str();
        let item = split_generic_args(args).into_iter().next()?;
        Some((*shape, item.to_string()))
    })
}

/// Extract the item type from a collection's long name.
///
/// Returns `None` (and logs) when the name matches no known container.
pub fn extract_item_type(long_name: &str) -> Option<String> {
    match container_shape(long_name) {
        Some((_, item)) => Some(item),
        None => {
            tracing::warn!(long_name, "could not extract item type from container name");
            None
        }
    }
}

/// Resolve the item long name of a List/Set definition.
///
/// Follows `items.type.$ref`, except when it points back at the container,
/// in which case the generic arguments are used.
pub fn resolve_item_type(definition: &TypeDefinition) -> Result<String, CompileError> {
    let long_name = definition.long_name()?;
    let reference = definition.item_ref().ok_or_else(|| {
        CompileError::malformed(long_name, "missing 'items.type.$ref'")
    })?;
    let name = ref_name(reference);
    if name != long_name {
        return Ok(name.to_string());
    }
    let item = extract_item_type(long_name).ok_or_else(|| CompileError::UnsupportedContainer {
        long_name: long_name.to_string(),
    })?;
    tracing::debug!(long_name, item = %item, "resolved self-referential collection");
    Ok(item)
}

/// Split a generic argument list at top-level commas.
///
/// `"K, alloc::vec::Vec<(u8, u8)>"` → `["K", "alloc::vec::Vec<(u8, u8)>"]`.
pub fn split_generic_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn type_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9_]{0,8}", 1..4).prop_map(|segments| segments.join("::"))
    }

    proptest! {
        /// Any plain path wrapped in `Vec<...>` comes back unchanged.
        #[test]
        fn vec_extraction_returns_argument(item in type_path()) {
            let long_name = format!("alloc::vec::Vec<{item}>");
            prop_assert_eq!(extract_item_type(&long_name), Some(item));
        }

        /// Inline capacity never leaks into the item type.
        #[test]
        fn smallvec_extraction_drops_capacity(item in type_path(), n in 1u32..4096) {
            let long_name = format!("smallvec::SmallVec<[{item}; {n}]>");
            prop_assert_eq!(extract_item_type(&long_name), Some(item));
        }

        /// Extraction never panics on arbitrary input.
        #[test]
        fn extraction_never_panics(s in ".{0,64}") {
            let _ = extract_item_type(&s);
        }
    }
}
