//! # cforge-compiler: Schema Compiler, Value Trees & Edit Dispatch
//!
//! Compiles reflected component types into editable field groups and
//! writes edited values back in the schema's native JSON shape.
//!
//! ## Compilation (`compile`, `handlers`, `wrapper`)
//!
//! [`SchemaCompiler`] walks a [`TypeRegistry`](cforge_registry::TypeRegistry)
//! from each top-level component, dispatching on `typeInfo` to one kind
//! handler per shape. Cycles, excessive depth, and unresolved references
//! cut off only the branch they occur in. Every group is registered once in
//! the registry cache under a name derived from its nesting path.
//!
//! ## Values (`value`, `serialize`, `populate`)
//!
//! [`GroupValue`] instantiates a compiled group with defaults and applies
//! path-addressed edits. [`ValueSerializer`] turns a value tree into JSON;
//! [`populate`] goes the other way for values already stored on an item.
//!
//! ## Edits (`dispatch`)
//!
//! [`EditDispatcher`] consumes [`FieldChanged`] events, re-serializes the
//! owning component, and stores it through a [`ComponentStore`].
//!
//! ## Crate Policy
//!
//! - Single-threaded. The registry is borrowed `&mut` while compiling and
//!   `&` while serializing or dispatching.
//! - Compile failures are recorded in the registry diagnostics, never
//!   returned past [`SchemaCompiler::compile`].

pub mod compile;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod populate;
pub mod serialize;
pub mod value;
pub mod wrapper;

pub use compile::{
    CompileOptions, CompileSummary, CompilerConfig, ProcessedTypes, SchemaCompiler,
    DEFAULT_MAX_DEPTH,
};
pub use dispatch::{
    BevyComponentsBlob, ComponentStore, EditDispatcher, EditOutcome, EditableItem,
    COMPONENTS_PROPERTY, DISABLE_UPDATE_FLAG,
};
pub use error::{EditError, SerializeError, StoreError};
pub use populate::{populate, populate_or_default};
pub use serialize::ValueSerializer;
pub use value::{CollectionValue, FieldChanged, FieldPath, FieldValue, GroupValue, PathSegment};
