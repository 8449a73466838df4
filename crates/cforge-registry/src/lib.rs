//! # cforge-registry: Type Registry & Reference Resolution
//!
//! Everything the schema compiler reads from, and the cache it writes into.
//!
//! ## Definitions (`definition`)
//!
//! [`TypeDefinition`] is a lenient, typed view over one schema entry. Its
//! `typeInfo` tag decodes to the closed [`TypeKind`] vocabulary; anything
//! else is a [`CompileError::MalformedDefinition`].
//!
//! ## Resolution (`resolve`)
//!
//! `$ref` stripping and generic-name item extraction for collections that
//! reference themselves (`Vec<T>`, `SmallVec<[T; N]>`, `HashSet<T>`,
//! `BTreeSet<T>`).
//!
//! ## Primitive Tables (`primitives`)
//!
//! Defaults and editable-field kinds for leaf types, supplied by the host.
//! [`PrimitiveTable::builtin`] covers Rust scalars and strings.
//!
//! ## Registry (`registry`)
//!
//! [`TypeRegistry`] owns the schema, the primitive tables, the
//! compiled-group cache, and [`Diagnostics`]. It is constructed explicitly
//! and passed to the compiler by `&mut`; there is no global instance.
//!
//! ## Crate Policy
//!
//! - No compilation logic lives here; see `cforge-compiler`.
//! - Compile errors are values, recorded in diagnostics, never panics.

pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod group;
pub mod primitives;
pub mod registry;
pub mod resolve;

pub use definition::{type_ref, TypeDefinition, TypeKind, VariantDefinition, DEFS_REF_PREFIX};
pub use diagnostics::{CompileFailure, Diagnostics};
pub use error::{CompileError, RegistryError};
pub use group::{
    CompiledFieldGroup, FieldSpec, GroupHandle, GroupName, GroupShape, NestingPath,
    PrimitiveField, PLACEHOLDER_FIELD, UNIT_STRUCT_FIELD, WRAPPER_PREFIX, WRAPPER_VALUE_FIELD,
};
pub use primitives::{FieldKind, FieldKindSpec, PrimitiveTable, MAX_PRESET, MIN_PRESET};
pub use registry::TypeRegistry;
pub use resolve::{container_shape, extract_item_type, ref_name, resolve_item_type, ContainerShape};
