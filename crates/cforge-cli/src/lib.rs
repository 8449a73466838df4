//! # cforge-cli: Command-Line Front End
//!
//! Provides the `cforge` binary, a stand-in for the host integration:
//!
//! - `cforge compile`: compile the schema and print the group tree.
//! - `cforge defaults`: print a component's default JSON.
//! - `cforge edit`: apply edits to a component store file.
//! - `cforge watch`: recompile whenever the schema file changes.
//!
//! ```bash
//! cforge compile --strict
//! cforge defaults --component Health
//! cforge edit --store cube.json --component Health --set current=50
//! ```

pub mod compile;
pub mod config;
pub mod defaults;
pub mod edit;
pub mod render;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cforge_compiler::{CompilerConfig, SchemaCompiler};
use cforge_registry::{GroupHandle, TypeRegistry};

use crate::config::Settings;

/// Settings plus the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub settings: Settings,
    pub base_dir: PathBuf,
}

impl Workspace {
    pub fn new(settings: Settings, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            base_dir: base_dir.into(),
        }
    }

    /// Load settings from `config` (if any) and the environment.
    pub fn from_config(config: Option<&Path>) -> Result<Self> {
        let settings = Settings::load(config)?;
        let base_dir = match config.and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir().context("cannot determine working directory")?,
        };
        Ok(Self::new(settings, base_dir))
    }

    pub fn schema_path(&self) -> PathBuf {
        self.settings.schema_path_full(&self.base_dir)
    }

    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            max_depth: self.settings.max_depth,
        }
    }

    /// Read the schema and primitive tables into a fresh registry.
    pub fn load_registry(&self) -> Result<TypeRegistry> {
        let primitives = self.settings.primitive_table(&self.base_dir)?;
        let path = self.schema_path();
        let registry = TypeRegistry::from_path(&path, primitives)
            .with_context(|| format!("failed to load schema {}", path.display()))?;
        tracing::info!(schema = %path.display(), types = registry.top_level_names().len(), "loaded schema");
        Ok(registry)
    }

    /// Compile one component, failing when it cannot be compiled.
    pub fn compile_component(&self, registry: &mut TypeRegistry, component: &str) -> Result<GroupHandle> {
        let handle = SchemaCompiler::with_config(registry, self.compiler_config()).compile_component(component);
        handle.with_context(|| {
            format!(
                "component '{component}' could not be compiled:\n{}",
                registry.diagnostics()
            )
        })
    }
}
