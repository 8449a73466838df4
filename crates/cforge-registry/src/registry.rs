//! # Type Registry
//!
//! Owns everything a compilation pass reads or writes:
//!
//! - the definitions of the loaded schema, keyed by long name;
//! - the primitive tables;
//! - the compiled-group cache;
//! - the diagnostics surface.
//!
//! ## Lifecycle
//!
//! `load` → (compile, serialize, edit ...) → `invalidate` or `reload`.
//!
//! `invalidate` drops the cache and diagnostics but keeps the schema.
//! `reload` swaps in a new document and then invalidates, so no group
//! compiled against the old schema survives.
//!
//! ## Definition Roots
//!
//! Definitions come from the `$defs` root, then from `components`. A long
//! name appearing in both keeps its first definition.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::definition::TypeDefinition;
use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, RegistryError};
use crate::group::{CompiledFieldGroup, GroupHandle, GroupName};
use crate::primitives::PrimitiveTable;

const DEFS_ROOT: &str = "$defs";
const COMPONENTS_ROOT: &str = "components";

/// Schema, primitive tables, compiled-group cache and diagnostics.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    definitions: IndexMap<String, Arc<TypeDefinition>>,
    /// Top-level compile order: components first, then the rest of `$defs`.
    top_level: Vec<String>,
    primitives: PrimitiveTable,
    cache: IndexMap<GroupName, Arc<CompiledFieldGroup>>,
    diagnostics: Diagnostics,
}

impl TypeRegistry {
    /// Build a registry from a parsed schema document.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingRoots`] when the document has neither
    /// a `$defs` nor a `components` object. Individual entries that are not
    /// objects are recorded as malformed, not rejected.
    pub fn load(document: Value, primitives: PrimitiveTable) -> Result<Self, RegistryError> {
        let mut registry = Self {
            definitions: IndexMap::new(),
            top_level: Vec::new(),
            primitives,
            cache: IndexMap::new(),
            diagnostics: Diagnostics::new(),
        };
        registry.ingest(&document)?;
        Ok(registry)
    }

    /// Parse a schema document from a JSON string.
    pub fn from_json_str(source: &str, primitives: PrimitiveTable) -> Result<Self, RegistryError> {
        let document = parse_document("<inline>", source)?;
        Self::load(document, primitives)
    }

    /// Read and parse a schema document from disk.
    pub fn from_path(path: impl AsRef<Path>, primitives: PrimitiveTable) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::SchemaLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let document = parse_document(&path.display().to_string(), &content)?;
        Self::load(document, primitives)
    }

    fn ingest(&mut self, document: &Value) -> Result<(), RegistryError> {
        let defs = document.get(DEFS_ROOT).and_then(Value::as_object);
        let components = document.get(COMPONENTS_ROOT).and_then(Value::as_object);
        if defs.is_none() && components.is_none() {
            return Err(RegistryError::MissingRoots);
        }

        let mut definitions = IndexMap::new();
        let mut component_names = Vec::new();
        for (root, entries) in [(DEFS_ROOT, defs), (COMPONENTS_ROOT, components)] {
            let Some(entries) = entries else { continue };
            for (key, raw) in entries {
                if root == COMPONENTS_ROOT {
                    component_names.push(key.clone());
                }
                if definitions.contains_key(key) {
                    tracing::debug!(long_name = %key, root, "duplicate definition ignored");
                    continue;
                }
                match TypeDefinition::from_value(raw) {
                    Ok(definition) => {
                        definitions.insert(key.clone(), Arc::new(definition));
                    }
                    Err(error) => {
                        tracing::error!(long_name = %key, %error, "unreadable schema entry");
                        self.diagnostics.record(Some(key), error);
                    }
                }
            }
        }

        let mut top_level: Vec<String> = Vec::with_capacity(definitions.len());
        for name in component_names {
            if definitions.contains_key(&name) && !top_level.contains(&name) {
                top_level.push(name);
            }
        }
        for name in definitions.keys() {
            if !top_level.contains(name) {
                top_level.push(name.clone());
            }
        }

        tracing::info!(
            definitions = definitions.len(),
            top_level = top_level.len(),
            "schema loaded"
        );
        self.definitions = definitions;
        self.top_level = top_level;
        Ok(())
    }

    pub fn definition(&self, long_name: &str) -> Option<Arc<TypeDefinition>> {
        self.definitions.get(long_name).cloned()
    }

    /// Like [`definition`](Self::definition), but an absent name is an
    /// [`UnresolvedReference`](CompileError::UnresolvedReference).
    pub fn require(&self, long_name: &str) -> Result<Arc<TypeDefinition>, CompileError> {
        self.definition(long_name)
            .ok_or_else(|| CompileError::UnresolvedReference {
                ref_name: long_name.to_string(),
            })
    }

    pub fn contains(&self, long_name: &str) -> bool {
        self.definitions.contains_key(long_name)
    }

    /// Whether the schema defines any type at all.
    pub fn has_type_infos(&self) -> bool {
        !self.definitions.is_empty()
    }

    /// Names compiled by a full pass, in order.
    pub fn top_level_names(&self) -> &[String] {
        &self.top_level
    }

    pub fn primitives(&self) -> &PrimitiveTable {
        &self.primitives
    }

    pub fn is_primitive(&self, long_name: &str) -> bool {
        self.primitives.is_primitive(long_name)
    }

    pub fn cached_group(&self, name: &GroupName) -> Option<GroupHandle> {
        self.cache
            .get(name)
            .map(|group| GroupHandle::new(name.clone(), Arc::clone(group)))
    }

    /// Register a compiled group.
    ///
    /// A name that is already registered keeps its first group; the existing
    /// handle is returned.
    pub fn register_group(&mut self, name: GroupName, group: CompiledFieldGroup) -> GroupHandle {
        if let Some(existing) = self.cached_group(&name) {
            tracing::warn!(group = %name, "group already registered");
            return existing;
        }
        let group = Arc::new(group);
        self.cache.insert(name.clone(), Arc::clone(&group));
        tracing::debug!(group = %name, "registered group");
        GroupHandle::new(name, group)
    }

    pub fn registered_count(&self) -> usize {
        self.cache.len()
    }

    pub fn registered_names(&self) -> impl Iterator<Item = &GroupName> {
        self.cache.keys()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Drop every compiled group and all diagnostics.
    pub fn invalidate(&mut self) {
        let dropped = self.cache.len();
        self.cache.clear();
        self.diagnostics.clear();
        tracing::info!(dropped, "registry invalidated");
    }

    /// Replace the schema document, discarding all compiled state.
    ///
    /// On error the registry is left unchanged.
    pub fn reload(&mut self, document: Value) -> Result<(), RegistryError> {
        let mut fresh = Self::load(document, self.primitives.clone())?;
        std::mem::swap(self, &mut fresh);
        Ok(())
    }
}

fn parse_document(origin: &str, source: &str) -> Result<Value, RegistryError> {
    serde_json::from_str(source).map_err(|e| RegistryError::SchemaLoad {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}
