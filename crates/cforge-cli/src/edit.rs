//! # Edit Subcommand
//!
//! Applies edits to one component of an item file and persists the result
//! the way the host does after each UI change.
//!
//! An item file is a JSON object holding the item's custom properties:
//!
//! ```json
//! { "bevy_components": "{\"Health\":{\"current\":50.0}}", "__disable__update": false }
//! ```
//!
//! Other properties are carried through unchanged when the file is written.
//!
//! Edits run in order: pushes, then removals, then assignments.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use cforge_compiler::{
    BevyComponentsBlob, EditDispatcher, EditOutcome, EditableItem, FieldPath, GroupValue,
    ValueSerializer, COMPONENTS_PROPERTY, DISABLE_UPDATE_FLAG,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Workspace;

/// Arguments for `cforge edit`.
#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Item file to edit; created when missing.
    #[arg(long)]
    pub store: PathBuf,

    /// Component long name.
    #[arg(long)]
    pub component: String,

    /// Assign a field: `PATH=JSON`, e.g. `stats.level=3` or `name=Bob`.
    #[arg(long = "set", value_name = "PATH=JSON")]
    pub assignments: Vec<String>,

    /// Append a default item to the collection at PATH.
    #[arg(long = "push", value_name = "PATH")]
    pub pushes: Vec<String>,

    /// Remove an item: `PATH=INDEX`.
    #[arg(long = "remove", value_name = "PATH=INDEX")]
    pub removals: Vec<String>,

    /// Apply edits without writing the item file.
    #[arg(long)]
    pub dry_run: bool,
}

/// Custom properties of one host item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ItemFile {
    properties: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for ItemFile {
    type Error = String;

    fn try_from(properties: Map<String, Value>) -> Result<Self, Self::Error> {
        match properties.get(COMPONENTS_PROPERTY) {
            None | Some(Value::String(_)) => {}
            Some(other) => return Err(format!("'{COMPONENTS_PROPERTY}' must be a string, found {other}")),
        }
        match properties.get(DISABLE_UPDATE_FLAG) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => return Err(format!("'{DISABLE_UPDATE_FLAG}' must be a bool, found {other}")),
        }
        Ok(Self { properties })
    }
}

impl From<ItemFile> for Map<String, Value> {
    fn from(file: ItemFile) -> Self {
        file.properties
    }
}

impl ItemFile {
    /// An item holding `components` as its component blob.
    pub fn with_components(components: impl Into<String>) -> Self {
        let mut file = Self::default();
        file.set_components(components);
        file
    }

    /// Read `path`, or an empty item when it does not exist.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read item file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid item file {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content + "\n")
            .with_context(|| format!("cannot write item file {}", path.display()))
    }

    /// The component blob, empty when the item has none.
    pub fn components(&self) -> &str {
        self.properties
            .get(COMPONENTS_PROPERTY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn set_components(&mut self, components: impl Into<String>) {
        self.properties
            .insert(COMPONENTS_PROPERTY.to_string(), Value::String(components.into()));
    }

    /// Whether the item suppresses writes.
    pub fn updates_disabled(&self) -> bool {
        self.properties
            .get(DISABLE_UPDATE_FLAG)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_updates_disabled(&mut self, disabled: bool) {
        self.properties
            .insert(DISABLE_UPDATE_FLAG.to_string(), Value::Bool(disabled));
    }
}

/// Result of an edit run.
#[derive(Debug, Clone, PartialEq)]
pub struct EditReport {
    /// The component's value after all edits.
    pub value: Value,
    /// Number of edits that were persisted.
    pub persisted: usize,
    /// Number of edits suppressed by an update flag.
    pub suppressed: usize,
}

/// Split `PATH=JSON`. A value that is not valid JSON is taken as a string.
pub fn parse_assignment(raw: &str) -> Result<(FieldPath, Value)> {
    let Some((path, value)) = raw.split_once('=') else {
        bail!("expected PATH=VALUE, got '{raw}'");
    };
    let path: FieldPath = path.trim().parse()?;
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((path, value))
}

/// Split `PATH=INDEX`.
pub fn parse_removal(raw: &str) -> Result<(FieldPath, usize)> {
    let Some((path, index)) = raw.split_once('=') else {
        bail!("expected PATH=INDEX, got '{raw}'");
    };
    let index = index
        .trim()
        .parse()
        .with_context(|| format!("invalid index in '{raw}'"))?;
    Ok((path.trim().parse()?, index))
}

/// Apply the requested edits and write the item file unless `dry_run`.
pub fn apply_edits(args: &EditArgs, workspace: &Workspace) -> Result<EditReport> {
    let assignments = args
        .assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;
    let removals = args
        .removals
        .iter()
        .map(|raw| parse_removal(raw))
        .collect::<Result<Vec<_>>>()?;
    let pushes = args
        .pushes
        .iter()
        .map(|raw| raw.trim().parse::<FieldPath>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut registry = workspace.load_registry()?;
    let handle = workspace.compile_component(&mut registry, &args.component)?;

    let mut file = ItemFile::read(&args.store)?;
    let name = args
        .store
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut item = EditableItem::new(name, BevyComponentsBlob::new(file.components()));
    item.disable_updates = file.updates_disabled();
    item.attach(GroupValue::instantiate(&handle))?;

    let dispatcher = EditDispatcher::new(&registry)
        .with_updates_disabled(workspace.settings.disable_all_object_updates);
    let component = args.component.as_str();
    let mut outcomes = Vec::new();
    for path in &pushes {
        outcomes.push(dispatcher.push(&mut item, component, path)?);
    }
    for (path, index) in &removals {
        outcomes.push(dispatcher.remove(&mut item, component, path, *index)?);
    }
    for (path, value) in assignments {
        outcomes.push(dispatcher.apply(&mut item, component, &path, value)?);
    }

    let persisted = outcomes
        .iter()
        .filter(|o| matches!(o, EditOutcome::Persisted(_)))
        .count();
    let suppressed = outcomes
        .iter()
        .filter(|o| matches!(o, EditOutcome::Suppressed))
        .count();

    let current = item
        .components
        .get(component)
        .with_context(|| format!("component '{component}' is not attached"))?;
    let value = ValueSerializer::new(&registry).serialize_component(current)?;

    if persisted > 0 && !args.dry_run {
        file.set_components(item.store.into_inner());
        file.write(&args.store)?;
        tracing::info!(store = %args.store.display(), persisted, "item file written");
    }
    Ok(EditReport {
        value,
        persisted,
        suppressed,
    })
}

/// Execute the edit subcommand.
pub fn run_edit(args: &EditArgs, workspace: &Workspace) -> Result<u8> {
    let report = apply_edits(args, workspace)?;
    println!("{}", serde_json::to_string_pretty(&report.value)?);
    if report.suppressed > 0 {
        tracing::warn!(suppressed = report.suppressed, "edits were not persisted: updates are disabled");
    }
    Ok(0)
}
