//! # Schema Compiler
//!
//! The dispatcher every kind handler recurses through. It is the single
//! place that enforces the recursion guards and the memoization contract.
//!
//! ## Guards, in order
//!
//! 1. `depth > max_depth` ⇒ [`CompileError::DepthExceeded`].
//! 2. No `long_name` ⇒ [`CompileError::MalformedDefinition`].
//! 3. `long_name` already on the active stack ⇒ [`CompileError::Cycle`].
//! 4. Group name already registered ⇒ the cached group is returned.
//! 5. Unrecognized `typeInfo` ⇒ [`CompileError::MalformedDefinition`].
//!
//! The long name is pushed onto [`ProcessedTypes`] before dispatch and
//! popped afterwards, so the set always holds exactly the types on the
//! current path from the root component.
//!
//! ## Failure Containment
//!
//! [`SchemaCompiler::compile`] never returns an error. A failed branch is
//! logged, recorded in the registry's diagnostics against the top-level
//! component, and yields `None`; the caller decides how to degrade.

use std::collections::HashSet;

use cforge_registry::{
    CompileError, CompiledFieldGroup, GroupHandle, GroupName, NestingPath, TypeDefinition,
    TypeRegistry,
};

/// Default recursion ceiling.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Long names on the active recursion stack of one top-level compile.
pub type ProcessedTypes = HashSet<String>;

/// Pass-wide compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Whether the group is compiled beneath another one. Nested groups are
    /// registered under their nesting path; top-level ones under the bare
    /// long name.
    pub nested: bool,
}

impl CompileOptions {
    pub const TOP_LEVEL: Self = Self { nested: false };
    pub const NESTED: Self = Self { nested: true };
}

/// Outcome of [`SchemaCompiler::compile_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub compiled: Vec<GroupName>,
    pub failed: Vec<String>,
}

impl CompileSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Recursive type walker over a [`TypeRegistry`].
pub struct SchemaCompiler<'r> {
    pub(crate) registry: &'r mut TypeRegistry,
    pub(crate) config: CompilerConfig,
}

impl<'r> SchemaCompiler<'r> {
    pub fn new(registry: &'r mut TypeRegistry) -> Self {
        Self::with_config(registry, CompilerConfig::default())
    }

    pub fn with_config(registry: &'r mut TypeRegistry, config: CompilerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &*self.registry
    }

    pub fn config(&self) -> CompilerConfig {
        self.config
    }

    /// Compile one top-level definition by long name.
    pub fn compile_component(&mut self, long_name: &str) -> Option<GroupHandle> {
        let definition = match self.registry.require(long_name) {
            Ok(definition) => definition,
            Err(error) => {
                tracing::warn!(long_name, "component is not defined in the schema");
                let diagnostics = self.registry.diagnostics_mut();
                diagnostics.add_missing_type(long_name);
                diagnostics.add_invalid_component(long_name);
                diagnostics.record(Some(long_name), error);
                return None;
            }
        };
        let path = NestingPath::for_component(long_name);
        let mut processed = ProcessedTypes::new();
        self.compile(&definition, CompileOptions::TOP_LEVEL, &path, 0, &mut processed)
    }

    /// Compile every top-level definition in registry order.
    pub fn compile_all(&mut self) -> CompileSummary {
        let names = self.registry.top_level_names().to_vec();
        let mut summary = CompileSummary::default();
        for name in names {
            match self.compile_component(&name) {
                Some(handle) => summary.compiled.push(handle.name),
                None => summary.failed.push(name),
            }
        }
        tracing::info!(
            compiled = summary.compiled.len(),
            failed = summary.failed.len(),
            groups = self.registry.registered_count(),
            "compile pass finished"
        );
        summary
    }

    /// Compile `definition`, logging and recording any failure.
    pub fn compile(
        &mut self,
        definition: &TypeDefinition,
        options: CompileOptions,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Option<GroupHandle> {
        match self.try_compile(definition, options, path, depth, processed) {
            Ok(handle) => Some(handle),
            Err(error) => {
                self.report(definition, path, error);
                None
            }
        }
    }

    /// Compile `definition`, returning the failure to the caller instead of
    /// recording it.
    pub fn try_compile(
        &mut self,
        definition: &TypeDefinition,
        options: CompileOptions,
        path: &NestingPath,
        depth: usize,
        processed: &mut ProcessedTypes,
    ) -> Result<GroupHandle, CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::DepthExceeded {
                long_name: definition.display_name().to_string(),
                max_depth: self.config.max_depth,
            });
        }
        let long_name = definition.long_name()?;
        if processed.contains(long_name) {
            return Err(CompileError::Cycle {
                long_name: long_name.to_string(),
            });
        }

        let name = GroupName::for_compile(options.nested, path, long_name);
        if let Some(handle) = self.registry.cached_group(&name) {
            tracing::trace!(group = %name, "group cache hit");
            return Ok(handle);
        }

        let kind = definition.kind()?;
        processed.insert(long_name.to_string());
        let result = self.dispatch(kind, definition, path, depth + 1, processed);
        processed.remove(long_name);

        let group: CompiledFieldGroup = result?;
        if group.is_empty() {
            return Err(CompileError::MalformedDefinition {
                long_name: long_name.to_string(),
                reason: "compiled to a group without fields".to_string(),
            });
        }
        Ok(self.registry.register_group(name, group))
    }

    fn report(&mut self, definition: &TypeDefinition, path: &NestingPath, error: CompileError) {
        let long_name = definition.display_name();
        match &error {
            CompileError::MalformedDefinition { .. } => {
                tracing::error!(long_name, path = %path, %error, "malformed definition");
            }
            _ => {
                tracing::warn!(long_name, path = %path, kind = error.kind_label(), %error, "branch skipped");
            }
        }
        let component = path.root().unwrap_or(long_name).to_string();
        self.registry.diagnostics_mut().record(Some(&component), error);
    }
}
