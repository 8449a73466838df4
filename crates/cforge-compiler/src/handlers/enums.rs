//! Enum handler.
//!
//! An enum group holds a `selection` choice over all variant names and one
//! `variant_<Name>` nested group per data-carrying variant. Each payload is
//! compiled from a copy of its definition renamed to `<enum>::<Name>`, so
//! payload groups never collide with real schema types.

use cforge_registry::{
    CompileError, CompiledFieldGroup, FieldSpec, GroupShape, NestingPath, PrimitiveField,
    TypeDefinition, VariantDefinition,
};

use super::{SELECTION_FIELD, VARIANT_PREFIX};
use crate::compile::{CompileOptions, ProcessedTypes, SchemaCompiler};

impl SchemaCompiler<'_> {
    pub(crate) fn compile_enum(
        &mut self,
        definition: &TypeDefinition,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<CompiledFieldGroup, CompileError> {
        let long_name = definition.long_name()?;
        let variants = definition.variants()?;
        let names = variants.iter().map(|v| v.name().to_string()).collect();

        let mut group = CompiledFieldGroup::new(long_name, GroupShape::Enum);
        group.insert(
            SELECTION_FIELD,
            FieldSpec::Primitive(PrimitiveField::choice(SELECTION_FIELD, names)),
        );

        for variant in &variants {
            let VariantDefinition::Data { name, definition: payload } = variant else {
                continue;
            };
            let synthetic = payload.renamed(format!("{long_name}::{name}"));
            let field = format!("{VARIANT_PREFIX}{name}");
            let spec = match self.compile(&synthetic, CompileOptions::NESTED, &path.child(name), depth, processed) {
                Some(handle) => FieldSpec::Nested(handle),
                None => FieldSpec::placeholder(field.as_str(), format!("{name} (unavailable)")),
            };
            group.insert(field, spec);
        }
        Ok(group)
    }
}
