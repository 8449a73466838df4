//! Defaults subcommand: print the JSON an untouched component serializes to.

use anyhow::Result;
use clap::Args;
use cforge_compiler::ValueSerializer;
use serde_json::{Map, Value};

use crate::Workspace;

/// Arguments for `cforge defaults`.
#[derive(Args, Debug, Default)]
pub struct DefaultsArgs {
    /// Component long name; every compilable component and resource when omitted.
    #[arg(long)]
    pub component: Option<String>,
}

/// Default JSON of one component, or a map over every compilable type
/// flagged `isComponent` or `isResource`.
pub fn default_values(args: &DefaultsArgs, workspace: &Workspace) -> Result<Value> {
    let mut registry = workspace.load_registry()?;
    if let Some(component) = &args.component {
        let handle = workspace.compile_component(&mut registry, component)?;
        return Ok(ValueSerializer::new(&registry).default_json(&handle)?);
    }

    let names: Vec<String> = registry
        .top_level_names()
        .iter()
        .filter(|name| {
            registry
                .definition(name)
                .is_some_and(|definition| definition.is_component || definition.is_resource)
        })
        .cloned()
        .collect();
    let mut handles = Vec::new();
    for name in &names {
        match workspace.compile_component(&mut registry, name) {
            Ok(handle) => handles.push((name, handle)),
            Err(e) => tracing::warn!(component = %name, "skipped: {e:#}"),
        }
    }
    let serializer = ValueSerializer::new(&registry);
    let mut all = Map::new();
    for (name, handle) in handles {
        all.insert(name.clone(), serializer.default_json(&handle)?);
    }
    Ok(Value::Object(all))
}

/// Execute the defaults subcommand.
pub fn run_defaults(args: &DefaultsArgs, workspace: &Workspace) -> Result<u8> {
    let value = default_values(args, workspace)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(0)
}
