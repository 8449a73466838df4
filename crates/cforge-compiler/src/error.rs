//! Error types for serialization, population, edits, and component storage.
//!
//! Compilation itself never surfaces errors here; see
//! [`CompileError`](cforge_registry::CompileError).

use cforge_registry::{CompileError, FieldKind};
use thiserror::Error;

/// Failure converting between a value tree and schema-shaped JSON.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// The value's type has no definition in the registry.
    #[error("no definition for '{long_name}'")]
    MissingDefinition {
        long_name: String,
    },

    /// The definition itself is unusable.
    #[error(transparent)]
    Definition(#[from] CompileError),

    /// The value (or JSON) does not have the shape the type requires.
    #[error("shape mismatch in '{long_name}': expected {expected}, found {found}")]
    ShapeMismatch {
        long_name: String,
        expected: String,
        found: String,
    },

    /// An enum selection names no declared variant.
    #[error("'{variant}' is not a variant of '{long_name}'")]
    UnknownVariant {
        long_name: String,
        variant: String,
    },

    /// A data variant is selected but its payload group could not be compiled.
    #[error("variant '{variant}' of '{long_name}' has no payload group")]
    MissingVariantData {
        long_name: String,
        variant: String,
    },
}

/// Failure reading or writing the persisted component map.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The blob is not a JSON object.
    #[error("component blob is not a JSON object: {0}")]
    Corrupt(String),

    #[error("component blob JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure applying an edit to a value tree.
#[derive(Error, Debug)]
pub enum EditError {
    /// The field path could not be parsed or does not fit the tree.
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("no field '{field}' along '{path}'")]
    NoSuchField { path: String, field: String },

    /// The addressed field is a placeholder or a group, not an editable leaf.
    #[error("field '{path}' is not editable")]
    NotEditable { path: String },

    #[error("field '{path}' expects a {expected:?} value, got {value}")]
    TypeMismatch {
        path: String,
        expected: FieldKind,
        value: String,
    },

    #[error("index {index} out of range for '{path}' (length {len})")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("field '{path}' is not a collection")]
    NotACollection { path: String },

    /// The item has no value tree for the component.
    #[error("unknown component '{component}'")]
    UnknownComponent { component: String },

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
