//! # Kind Handlers
//!
//! One handler per `typeInfo` kind, all implemented on [`SchemaCompiler`]
//! so that they recurse through [`SchemaCompiler::compile`] and share its
//! guards. Handlers receive the depth of the group they build; any nested
//! compile they start is one level deeper.
//!
//! | kind                | handler                 |
//! |---------------------|-------------------------|
//! | Struct              | `structs`               |
//! | Enum                | `enums`                 |
//! | Tuple / TupleStruct | `tuples`                |
//! | List / Set          | `collections`           |
//! | Value / UnitStruct  | here                    |

mod collections;
mod enums;
mod structs;
mod tuples;

use cforge_registry::{
    CompileError, CompiledFieldGroup, FieldSpec, GroupShape, NestingPath, TypeDefinition, TypeKind,
    PLACEHOLDER_FIELD, UNIT_STRUCT_FIELD,
};

use crate::compile::{ProcessedTypes, SchemaCompiler};

/// Placeholder text of a Value-kind group.
pub const VALUE_PLACEHOLDER: &str = "Value Type";
/// Marker text of a UnitStruct group.
pub const UNIT_STRUCT_PLACEHOLDER: &str = "Unit Struct";
/// Placeholder text of a struct without properties.
pub const EMPTY_STRUCT_PLACEHOLDER: &str = "Empty Struct";
/// Placeholder text of a tuple without slots.
pub const EMPTY_TUPLE_PLACEHOLDER: &str = "Empty Tuple";
/// Placeholder text of a field whose type is not in the schema.
pub const UNKNOWN_TYPE_PLACEHOLDER: &str = "Struct N/A";

/// Choice field holding the active enum variant.
pub const SELECTION_FIELD: &str = "selection";
/// Prefix of the per-variant payload fields of an enum group.
pub const VARIANT_PREFIX: &str = "variant_";
/// Field naming the item type of a collection group.
pub const ITEM_LONG_NAME_FIELD: &str = "long_name";

/// Field holding the active item index of a collection field.
pub fn index_field(collection_field: &str) -> String {
    format!("{collection_field}_index")
}

/// Collection field name of a List or Set group.
pub fn collection_field(shape: GroupShape) -> Option<&'static str> {
    match shape {
        GroupShape::List => Some("list"),
        GroupShape::Set => Some("set"),
        _ => None,
    }
}

impl SchemaCompiler<'_> {
    pub(crate) fn dispatch(
        &mut self,
        kind: TypeKind,
        definition: &TypeDefinition,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<CompiledFieldGroup, CompileError> {
        let long_name = definition.long_name()?;
        tracing::debug!(long_name, %kind, depth, path = %path, "compiling");
        match kind {
            TypeKind::Struct => self.compile_struct(definition, path, depth, processed),
            TypeKind::Enum => self.compile_enum(definition, path, depth, processed),
            TypeKind::Tuple | TypeKind::TupleStruct => {
                self.compile_tuple(kind, definition, path, depth, processed)
            }
            TypeKind::List | TypeKind::Set => {
                self.compile_collection(kind, definition, path, depth, processed)
            }
            TypeKind::Value => Ok(CompiledFieldGroup::new(long_name, GroupShape::Value).with_field(
                PLACEHOLDER_FIELD,
                FieldSpec::placeholder(PLACEHOLDER_FIELD, VALUE_PLACEHOLDER),
            )),
            TypeKind::UnitStruct => Ok(CompiledFieldGroup::new(long_name, GroupShape::UnitStruct)
                .with_field(
                    UNIT_STRUCT_FIELD,
                    FieldSpec::placeholder(UNIT_STRUCT_FIELD, UNIT_STRUCT_PLACEHOLDER),
                )),
        }
    }
}

#[cfg(test)]
mod tests {
    use cforge_registry::{FieldSpec, GroupShape, PrimitiveTable, TypeRegistry};
    use serde_json::json;

    use super::*;

    #[test]
    fn value_and_unit_struct_get_marker_fields() {
        let mut registry = TypeRegistry::load(
            json!({ "$defs": {
                "game::Opaque": { "typeInfo": "Value", "long_name": "game::Opaque" },
                "game::Player": { "typeInfo": "UnitStruct", "long_name": "game::Player" }
            }}),
            PrimitiveTable::builtin(),
        )
        .unwrap();
        let mut compiler = SchemaCompiler::new(&mut registry);

        let opaque = compiler.compile_component("game::Opaque").unwrap();
        assert_eq!(opaque.group.shape, GroupShape::Value);
        assert_eq!(
            opaque.group.field(PLACEHOLDER_FIELD),
            Some(&FieldSpec::placeholder(PLACEHOLDER_FIELD, VALUE_PLACEHOLDER))
        );

        let player = compiler.compile_component("game::Player").unwrap();
        assert_eq!(player.group.shape, GroupShape::UnitStruct);
        assert!(player.group.field(UNIT_STRUCT_FIELD).is_some());
    }
}
