//! List and Set handler.
//!
//! Both compile to three fields:
//!
//! - `list` / `set`: the items, each an instance of the item group;
//! - `list_index` / `set_index`: the active item;
//! - `long_name`: the item type, `wrapper_`-prefixed for primitives.
//!
//! The item type must be defined in the schema. Primitive items are then
//! wrapped in a synthetic single-field group so every collection holds
//! groups. Unlike struct members, a collection whose item type cannot be
//! compiled fails as a whole.

use cforge_registry::{
    resolve_item_type, CompileError, CompiledFieldGroup, FieldKind, FieldSpec, GroupShape,
    NestingPath, PrimitiveField, TypeDefinition, TypeKind, MIN_PRESET, WRAPPER_PREFIX,
};
use serde_json::json;

use super::{collection_field, index_field, ITEM_LONG_NAME_FIELD};
use crate::compile::{CompileOptions, ProcessedTypes, SchemaCompiler};

impl SchemaCompiler<'_> {
    pub(crate) fn compile_collection(
        &mut self,
        kind: TypeKind,
        definition: &TypeDefinition,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<CompiledFieldGroup, CompileError> {
        let long_name = definition.long_name()?;
        let shape = GroupShape::from(kind);
        let field = collection_field(shape).ok_or_else(|| CompileError::MalformedDefinition {
            long_name: long_name.to_string(),
            reason: format!("{kind} is not a collection kind"),
        })?;
        let item = resolve_item_type(definition)?;
        if processed.contains(&item) {
            return Err(CompileError::Cycle { long_name: item });
        }

        let Some(item_definition) = self.registry.definition(&item) else {
            let diagnostics = self.registry.diagnostics_mut();
            diagnostics.add_missing_type(item.as_str());
            if let Some(root) = path.root() {
                diagnostics.add_invalid_component(root);
            }
            return Err(CompileError::UnresolvedReference { ref_name: item });
        };

        let container_path = path.child(long_name);
        let (item_group, item_label) = if self.registry.is_primitive(&item) {
            let handle = self.synthesize_wrapper(long_name, &item, &container_path)?;
            (handle, format!("{WRAPPER_PREFIX}{item}"))
        } else {
            let handle = self.try_compile(
                &item_definition,
                CompileOptions::NESTED,
                &container_path,
                depth,
                processed,
            )?;
            (handle, item)
        };

        let index = index_field(field);
        let mut group = CompiledFieldGroup::new(long_name, shape);
        group.insert(field, FieldSpec::Collection(item_group));
        group.insert(
            index.as_str(),
            FieldSpec::Primitive(
                PrimitiveField::new(index.as_str(), FieldKind::UInt, json!(0))
                    .with_presets([(MIN_PRESET.to_string(), json!(0))].into_iter().collect()),
            ),
        );
        group.insert(
            ITEM_LONG_NAME_FIELD,
            FieldSpec::Primitive(
                PrimitiveField::new(ITEM_LONG_NAME_FIELD, FieldKind::Text, json!(item_label)).silent(),
            ),
        );
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use cforge_registry::{PrimitiveTable, TypeRegistry};

    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::load(
            json!({ "$defs": {
                "alloc::vec::Vec<alloc::string::String>": {
                    "typeInfo": "List",
                    "long_name": "alloc::vec::Vec<alloc::string::String>",
                    "items": { "type": { "$ref": "#/$defs/alloc::vec::Vec<alloc::string::String>" } }
                },
                "alloc::vec::Vec<game::Item>": {
                    "typeInfo": "List",
                    "long_name": "alloc::vec::Vec<game::Item>",
                    "items": { "type": { "$ref": "#/$defs/game::Item" } }
                },
                "game::Item": {
                    "typeInfo": "Struct",
                    "long_name": "game::Item",
                    "properties": { "weight": { "type": { "$ref": "#/$defs/f32" } } }
                },
                "bevy_utils::HashSet<u32>": {
                    "typeInfo": "Set",
                    "long_name": "bevy_utils::HashSet<u32>",
                    "items": { "type": { "$ref": "#/$defs/u32" } }
                },
                "alloc::vec::Vec<game::Ghost>": {
                    "typeInfo": "List",
                    "long_name": "alloc::vec::Vec<game::Ghost>",
                    "items": { "type": { "$ref": "#/$defs/game::Ghost" } }
                },
                "alloc::vec::Vec<u8>": { "typeInfo": "List", "long_name": "alloc::vec::Vec<u8>" },
                "alloc::vec::Vec<u64>": {
                    "typeInfo": "List",
                    "long_name": "alloc::vec::Vec<u64>",
                    "items": { "type": { "$ref": "#/$defs/u64" } }
                },
                "game::Labels": {
                    "typeInfo": "Struct",
                    "long_name": "game::Labels",
                    "properties": {
                        "names": { "type": { "$ref": "#/$defs/alloc::vec::Vec<alloc::string::String>" } },
                        "aliases": { "type": { "$ref": "#/$defs/alloc::vec::Vec<alloc::string::String>" } }
                    }
                },
                "alloc::string::String": { "typeInfo": "Value", "long_name": "alloc::string::String" },
                "f32": { "typeInfo": "Value", "long_name": "f32" },
                "u32": { "typeInfo": "Value", "long_name": "u32" }
            }}),
            PrimitiveTable::builtin(),
        )
        .unwrap()
    }

    #[test]
    fn self_referential_list_wraps_primitive_item() {
        let mut registry = registry();
        let list = SchemaCompiler::new(&mut registry)
            .compile_component("alloc::vec::Vec<alloc::string::String>")
            .unwrap();
        assert_eq!(list.group.shape, GroupShape::List);
        match list.group.field("list") {
            Some(FieldSpec::Collection(item)) => {
                assert_eq!(item.group.shape, GroupShape::Wrapper);
                assert_eq!(item.group.long_name, "alloc::string::String");
            }
            other => panic!("unexpected field {other:?}"),
        }
        match list.group.field("long_name") {
            Some(FieldSpec::Primitive(field)) => {
                assert_eq!(field.default, json!("wrapper_alloc::string::String"));
                assert!(!field.notifies);
            }
            other => panic!("unexpected field {other:?}"),
        }
        assert!(list.group.field("list_index").is_some());
    }

    #[test]
    fn struct_items_compile_under_container_path() {
        let mut registry = registry();
        let list = SchemaCompiler::new(&mut registry)
            .compile_component("alloc::vec::Vec<game::Item>")
            .unwrap();
        match list.group.field("list") {
            Some(FieldSpec::Collection(item)) => {
                assert_eq!(item.group.shape, GroupShape::Struct);
                assert_eq!(
                    item.name.as_str(),
                    "alloc::vec::Vec<game::Item>/alloc::vec::Vec<game::Item>/game::Item"
                );
            }
            other => panic!("unexpected field {other:?}"),
        }
    }

    #[test]
    fn set_uses_set_fields() {
        let mut registry = registry();
        let set = SchemaCompiler::new(&mut registry)
            .compile_component("bevy_utils::HashSet<u32>")
            .unwrap();
        assert_eq!(set.group.shape, GroupShape::Set);
        let names: Vec<_> = set.group.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["set", "set_index", "long_name"]);
    }

    #[test]
    fn unknown_item_fails_and_is_recorded() {
        let mut registry = registry();
        assert!(SchemaCompiler::new(&mut registry)
            .compile_component("alloc::vec::Vec<game::Ghost>")
            .is_none());
        let diagnostics = registry.diagnostics();
        assert!(diagnostics.is_missing("game::Ghost"));
        assert!(diagnostics.is_invalid("alloc::vec::Vec<game::Ghost>"));
        assert_eq!(diagnostics.failures()[0].error.kind_label(), "unresolved-reference");
    }

    #[test]
    fn missing_items_is_malformed() {
        let mut registry = registry();
        assert!(SchemaCompiler::new(&mut registry)
            .compile_component("alloc::vec::Vec<u8>")
            .is_none());
        assert_eq!(
            registry.diagnostics().failures()[0].error.kind_label(),
            "malformed-definition"
        );
    }

    #[test]
    fn primitive_item_missing_from_schema_fails() {
        let mut registry = registry();
        assert!(SchemaCompiler::new(&mut registry)
            .compile_component("alloc::vec::Vec<u64>")
            .is_none());
        let diagnostics = registry.diagnostics();
        assert!(diagnostics.is_missing("u64"));
        assert!(diagnostics.is_invalid("alloc::vec::Vec<u64>"));
    }

    fn wrapper_names(registry: &TypeRegistry) -> Vec<String> {
        let mut names: Vec<String> = registry
            .registered_names()
            .map(|name| name.as_str().to_string())
            .filter(|name| name.rsplit('/').next().is_some_and(|leaf| leaf.starts_with(WRAPPER_PREFIX)))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn one_wrapper_per_container_path() {
        let mut registry = registry();
        let mut compiler = SchemaCompiler::new(&mut registry);
        compiler.compile_component("game::Labels").unwrap();
        compiler.compile_component("game::Labels").unwrap();
        assert_eq!(
            wrapper_names(&registry),
            [
                "game::Labels/aliases/alloc::vec::Vec<alloc::string::String>/wrapper_alloc::string::String",
                "game::Labels/names/alloc::vec::Vec<alloc::string::String>/wrapper_alloc::string::String",
            ]
        );
    }

    #[test]
    fn recompiling_a_container_under_one_path_reuses_its_wrapper() {
        let mut registry = registry();
        let list = registry.definition("alloc::vec::Vec<alloc::string::String>").unwrap();
        let path = NestingPath::for_component("game::Labels").child("names");
        let mut compiler = SchemaCompiler::new(&mut registry);
        let first = compiler
            .compile(&list, CompileOptions::NESTED, &path, 1, &mut ProcessedTypes::new())
            .unwrap();
        let second = compiler
            .compile(&list, CompileOptions::NESTED, &path, 1, &mut ProcessedTypes::new())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(wrapper_names(&registry).len(), 1);
    }
}
