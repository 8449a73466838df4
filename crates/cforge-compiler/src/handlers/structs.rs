//! Struct handler, plus the member compilation shared with tuples.
//!
//! A struct never fails outright: each property that cannot be compiled
//! becomes a placeholder field and the rest of the struct stays editable.

use cforge_registry::{
    ref_name, CompileError, CompiledFieldGroup, FieldSpec, GroupShape, NestingPath,
    PrimitiveField, TypeDefinition, PLACEHOLDER_FIELD,
};

use super::{EMPTY_STRUCT_PLACEHOLDER, UNKNOWN_TYPE_PLACEHOLDER};
use crate::compile::{CompileOptions, ProcessedTypes, SchemaCompiler};

impl SchemaCompiler<'_> {
    pub(crate) fn compile_struct(
        &mut self,
        definition: &TypeDefinition,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<CompiledFieldGroup, CompileError> {
        let long_name = definition.long_name()?;
        let mut group = CompiledFieldGroup::new(long_name, GroupShape::Struct);
        if definition.properties.is_empty() {
            group.insert(
                PLACEHOLDER_FIELD,
                FieldSpec::placeholder(PLACEHOLDER_FIELD, EMPTY_STRUCT_PLACEHOLDER),
            );
            return Ok(group);
        }
        for (property, reference) in definition.property_refs() {
            let spec = self.compile_member(long_name, path, property, reference, depth, processed);
            group.insert(property, spec);
        }
        Ok(group)
    }

    /// Compile one struct property or tuple slot.
    ///
    /// Types missing from the schema degrade to a placeholder, even when the
    /// primitive table knows them. Primitives become editable fields and
    /// other types recurse with `member` appended to the path.
    pub(crate) fn compile_member(
        &mut self,
        owner: &str,
        path: &NestingPath,
        member: &str,
        reference: Option<&str>,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> FieldSpec {
        let Some(reference) = reference else {
            let error = CompileError::MalformedDefinition {
                long_name: owner.to_string(),
                reason: format!("member '{member}' has no 'type.$ref'"),
            };
            tracing::error!(owner, member, %error, "member without type reference");
            self.registry.diagnostics_mut().record(path.root(), error);
            return FieldSpec::placeholder(member, UNKNOWN_TYPE_PLACEHOLDER);
        };
        let target = ref_name(reference);

        let Some(definition) = self.registry.definition(target) else {
            tracing::warn!(owner, member, missing = target, "reference to undefined type");
            let diagnostics = self.registry.diagnostics_mut();
            diagnostics.add_missing_type(target);
            if let Some(root) = path.root() {
                diagnostics.add_invalid_component(root);
            }
            diagnostics.record(
                path.root(),
                CompileError::UnresolvedReference {
                    ref_name: target.to_string(),
                },
            );
            return FieldSpec::placeholder(member, UNKNOWN_TYPE_PLACEHOLDER);
        };

        if self.registry.is_primitive(target) {
            let primitives = self.registry.primitives();
            return match primitives.field_kind(target) {
                Some(spec) => {
                    let default = primitives.default_value(target).cloned().unwrap_or_default();
                    FieldSpec::Primitive(
                        PrimitiveField::new(member, spec.kind, default)
                            .with_presets(spec.presets.clone()),
                    )
                }
                None => {
                    tracing::warn!(owner, member, primitive = target, "no field kind for primitive");
                    FieldSpec::placeholder(member, target)
                }
            };
        }

        match self.compile(&definition, CompileOptions::NESTED, &path.child(member), depth, processed) {
            Some(handle) => FieldSpec::Nested(handle),
            None => FieldSpec::placeholder(member, format!("{target} (unavailable)")),
        }
    }
}
