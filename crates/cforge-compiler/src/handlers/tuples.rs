//! Tuple and TupleStruct handler.
//!
//! Slots are named by position (`"0"`, `"1"`, ...) and compiled exactly like
//! struct properties.

use cforge_registry::{
    CompileError, CompiledFieldGroup, FieldSpec, GroupShape, NestingPath, TypeDefinition,
    TypeKind, PLACEHOLDER_FIELD,
};

use super::EMPTY_TUPLE_PLACEHOLDER;
use crate::compile::{ProcessedTypes, SchemaCompiler};

impl SchemaCompiler<'_> {
    pub(crate) fn compile_tuple(
        &mut self,
        kind: TypeKind,
        definition: &TypeDefinition,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<CompiledFieldGroup, CompileError> {
        let long_name = definition.long_name()?;
        let mut group = CompiledFieldGroup::new(long_name, GroupShape::from(kind));
        let slots = definition.slot_refs();
        if slots.is_empty() {
            group.insert(
                PLACEHOLDER_FIELD,
                FieldSpec::placeholder(PLACEHOLDER_FIELD, EMPTY_TUPLE_PLACEHOLDER),
            );
            return Ok(group);
        }
        for (index, reference) in slots.into_iter().enumerate() {
            let slot = index.to_string();
            let spec = self.compile_member(long_name, path, &slot, reference, depth, processed);
            group.insert(slot, spec);
        }
        Ok(group)
    }
}
