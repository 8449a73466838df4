//! Accumulated compile diagnostics.
//!
//! Mirrors what a host shows in its "missing types" panel: names that were
//! referenced but never defined, the top-level components affected by them,
//! and one record per failed branch.

use std::fmt;

use indexmap::IndexSet;

use crate::error::CompileError;

/// One branch-local failure and the component it was attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// Top-level component, when the failure happened beneath one.
    pub component: Option<String>,
    pub error: CompileError,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "[{}] {component}: {}", self.error.kind_label(), self.error),
            None => write!(f, "[{}] {}", self.error.kind_label(), self.error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    missing_types: IndexSet<String>,
    invalid_components: IndexSet<String>,
    failures: Vec<CompileFailure>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_missing_type(&mut self, long_name: impl Into<String>) {
        self.missing_types.insert(long_name.into());
    }

    pub fn add_invalid_component(&mut self, component: impl Into<String>) {
        self.invalid_components.insert(component.into());
    }

    /// Record a failure. Identical records are kept once.
    pub fn record(&mut self, component: Option<&str>, error: CompileError) {
        let failure = CompileFailure {
            component: component.map(str::to_string),
            error,
        };
        if !self.failures.contains(&failure) {
            self.failures.push(failure);
        }
    }

    pub fn missing_types(&self) -> impl Iterator<Item = &str> {
        self.missing_types.iter().map(String::as_str)
    }

    pub fn invalid_components(&self) -> impl Iterator<Item = &str> {
        self.invalid_components.iter().map(String::as_str)
    }

    pub fn failures(&self) -> &[CompileFailure] {
        &self.failures
    }

    pub fn is_missing(&self, long_name: &str) -> bool {
        self.missing_types.contains(long_name)
    }

    pub fn is_invalid(&self, component: &str) -> bool {
        self.invalid_components.contains(component)
    }

    pub fn is_empty(&self) -> bool {
        self.missing_types.is_empty() && self.invalid_components.is_empty() && self.failures.is_empty()
    }

    pub fn clear(&mut self) {
        self.missing_types.clear();
        self.invalid_components.clear();
        self.failures.clear();
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no diagnostics");
        }
        if !self.missing_types.is_empty() {
            writeln!(f, "missing types:")?;
            for name in &self.missing_types {
                writeln!(f, "  {name}")?;
            }
        }
        if !self.invalid_components.is_empty() {
            writeln!(f, "invalid components:")?;
            for name in &self.invalid_components {
                writeln!(f, "  {name}")?;
            }
        }
        if !self.failures.is_empty() {
            writeln!(f, "failures:")?;
            for failure in &self.failures {
                writeln!(f, "  {failure}")?;
            }
        }
        Ok(())
    }
}
