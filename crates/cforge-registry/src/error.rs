//! # Error Types
//!
//! Two families live here:
//!
//! - [`RegistryError`] covers loading a schema document or a primitive
//!   table. These are hard failures: without a schema there is nothing to
//!   compile.
//! - [`CompileError`] is the branch-local taxonomy recorded by the compiler.
//!   None of its variants ever escapes a top-level compile; they are logged,
//!   stored in [`Diagnostics`](crate::Diagnostics), and the branch degrades
//!   to an absent group or a placeholder field.

use thiserror::Error;

/// Error while loading a schema document or primitive table.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The schema file could not be read or parsed.
    #[error("schema load error for '{path}': {reason}")]
    SchemaLoad {
        /// Path or identifier of the schema document.
        path: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The document has neither a `$defs` nor a `components` root.
    #[error("schema document has no `$defs` or `components` root")]
    MissingRoots,

    /// The primitive default / field-kind table is invalid.
    #[error("primitive table error: {0}")]
    PrimitiveTable(String),

    /// IO error reading a schema or table.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A branch-local compilation failure.
///
/// Every variant names the type it was raised for so that the diagnostics
/// surface can point the user at the offending definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A required key is absent or the `typeInfo` tag is not recognized.
    #[error("malformed definition '{long_name}': {reason}")]
    MalformedDefinition {
        /// Long name of the definition, or `<unnamed>`.
        long_name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `$ref` target is not present in the type table.
    #[error("unresolved reference '{ref_name}'")]
    UnresolvedReference {
        /// The reference after `#/$defs/` stripping.
        ref_name: String,
    },

    /// The type is already on the active compile stack.
    #[error("cycle detected at '{long_name}'")]
    Cycle {
        /// Long name that closed the cycle.
        long_name: String,
    },

    /// The recursion ceiling was reached.
    #[error("maximum nesting depth {max_depth} exceeded at '{long_name}'")]
    DepthExceeded {
        /// Long name being compiled when the ceiling was hit.
        long_name: String,
        /// Configured ceiling.
        max_depth: usize,
    },

    /// A self-referential collection whose generic name matches no known
    /// container pattern.
    #[error("unsupported container shape '{long_name}'")]
    UnsupportedContainer {
        /// The container's long name.
        long_name: String,
    },
}

impl CompileError {
    /// Short, stable label for the error kind, used in reports.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::MalformedDefinition { .. } => "malformed-definition",
            Self::UnresolvedReference { .. } => "unresolved-reference",
            Self::Cycle { .. } => "cycle",
            Self::DepthExceeded { .. } => "depth-exceeded",
            Self::UnsupportedContainer { .. } => "unsupported-container-shape",
        }
    }

    pub(crate) fn malformed(long_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            long_name: long_name.into(),
            reason: reason.into(),
        }
    }
}
