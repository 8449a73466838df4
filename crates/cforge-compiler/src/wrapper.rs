//! Wrapper synthesis for primitive collection items.
//!
//! A wrapper is a one-field group (`value`) carrying the item's primitive
//! field kind. It is registered as `wrapper_<item>` under the container's
//! nesting path, so one container path yields one wrapper however often it
//! is compiled.

use cforge_registry::{
    CompileError, CompiledFieldGroup, FieldSpec, GroupHandle, GroupName, GroupShape, NestingPath,
    PrimitiveField, WRAPPER_VALUE_FIELD,
};

use crate::compile::SchemaCompiler;

impl SchemaCompiler<'_> {
    /// Register (or reuse) the wrapper for `item` beneath `path`.
    pub fn synthesize_wrapper(
        &mut self,
        container: &str,
        item: &str,
        path: &NestingPath,
    ) -> Result<GroupHandle, CompileError> {
        let name = GroupName::wrapper(path, item);
        if let Some(handle) = self.registry.cached_group(&name) {
            return Ok(handle);
        }

        let primitives = self.registry.primitives();
        let spec = primitives
            .field_kind(item)
            .ok_or_else(|| CompileError::MalformedDefinition {
                long_name: container.to_string(),
                reason: format!("item type '{item}' has no field kind"),
            })?;
        let default = primitives.default_value(item).cloned().unwrap_or_default();
        let field = PrimitiveField::new(WRAPPER_VALUE_FIELD, spec.kind, default)
            .with_presets(spec.presets.clone());
        let group = CompiledFieldGroup::new(item, GroupShape::Wrapper)
            .with_field(WRAPPER_VALUE_FIELD, FieldSpec::Primitive(field));

        tracing::debug!(container, item, wrapper = %name, "synthesized wrapper");
        Ok(self.registry.register_group(name, group))
    }
}

#[cfg(test)]
mod tests {
    use cforge_registry::{FieldKind, PrimitiveTable, TypeRegistry};
    use serde_json::json;

    use super::*;

    fn registry() -> TypeRegistry {
        let mut primitives = PrimitiveTable::builtin();
        primitives.insert_default("game::Opaque", json!(null));
        TypeRegistry::load(
            json!({ "$defs": {
                "f32": { "typeInfo": "Value", "long_name": "f32" },
                "u8": { "typeInfo": "Value", "long_name": "u8" },
                "game::Opaque": { "typeInfo": "Value", "long_name": "game::Opaque" }
            }}),
            primitives,
        )
        .unwrap()
    }

    #[test]
    fn same_item_under_same_path_registers_once() {
        let mut registry = registry();
        let path = NestingPath::for_component("game::Tags").child("0");
        let mut compiler = SchemaCompiler::new(&mut registry);
        let first = compiler.synthesize_wrapper("alloc::vec::Vec<f32>", "f32", &path).unwrap();
        let second = compiler.synthesize_wrapper("alloc::vec::Vec<f32>", "f32", &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name.as_str(), "game::Tags/0/wrapper_f32");
        assert_eq!(registry.registered_count(), 1);
    }

    #[test]
    fn different_paths_get_distinct_wrappers() {
        let mut registry = registry();
        let mut compiler = SchemaCompiler::new(&mut registry);
        let a = compiler
            .synthesize_wrapper("v", "f32", &NestingPath::for_component("A"))
            .unwrap();
        let b = compiler
            .synthesize_wrapper("v", "f32", &NestingPath::for_component("B"))
            .unwrap();
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn wrapper_field_uses_item_kind() {
        let mut registry = registry();
        let handle = SchemaCompiler::new(&mut registry)
            .synthesize_wrapper("v", "u8", &NestingPath::new())
            .unwrap();
        match handle.group.field(WRAPPER_VALUE_FIELD) {
            Some(FieldSpec::Primitive(field)) => {
                assert_eq!(field.kind, FieldKind::UInt);
                assert_eq!(field.default, json!(0));
                assert_eq!(field.presets.get("max"), Some(&json!(255)));
            }
            other => panic!("unexpected field {other:?}"),
        }
    }

    #[test]
    fn primitive_without_field_kind_cannot_be_wrapped() {
        let mut registry = registry();
        let err = SchemaCompiler::new(&mut registry)
            .synthesize_wrapper("v", "game::Opaque", &NestingPath::new())
            .unwrap_err();
        assert_eq!(err.kind_label(), "malformed-definition");
    }
}
