//! # Watch Subcommand
//!
//! Polls the schema file's modification time and, when it changes,
//! reloads the registry and recompiles every component. The interval
//! comes from `watcher_poll_frequency`.
//!
//! A schema that fails to parse mid-write is reported and the previous
//! registry kept; the next change retries.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Args;
use cforge_compiler::SchemaCompiler;
use cforge_registry::TypeRegistry;

use crate::Workspace;

/// Arguments for `cforge watch`.
#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Stop after this many polls (runs until interrupted when omitted).
    #[arg(long)]
    pub polls: Option<u64>,
}

/// What a single poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file does not exist.
    Missing,
    /// First observation of the file.
    FirstSeen,
    Unchanged,
    /// The modification time moved since the last poll.
    Changed,
}

/// Tracks one file's modification time across polls.
#[derive(Debug, Clone)]
pub struct SchemaWatcher {
    path: PathBuf,
    last_stamp: Option<SystemTime>,
}

impl SchemaWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_stamp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll(&mut self) -> std::io::Result<WatchEvent> {
        let stamp = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(WatchEvent::Missing),
            Err(e) => return Err(e),
        };
        Ok(match self.last_stamp.replace(stamp) {
            None => WatchEvent::FirstSeen,
            Some(previous) if previous == stamp => WatchEvent::Unchanged,
            Some(_) => WatchEvent::Changed,
        })
    }
}

/// Reload `registry` from `path` and recompile; returns the failed count.
pub fn reload_and_compile(registry: &mut TypeRegistry, path: &Path, workspace: &Workspace) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema {}", path.display()))?;
    let document = serde_json::from_str(&content)
        .with_context(|| format!("invalid schema JSON {}", path.display()))?;
    registry.reload(document)?;
    let summary = SchemaCompiler::with_config(registry, workspace.compiler_config()).compile_all();
    tracing::info!(
        compiled = summary.compiled.len(),
        failed = summary.failed.len(),
        "schema recompiled"
    );
    Ok(summary.failed.len())
}

/// Execute the watch subcommand.
pub fn run_watch(args: &WatchArgs, workspace: &Workspace) -> Result<u8> {
    if !workspace.settings.watcher_enabled {
        tracing::info!("watcher disabled in settings");
        return Ok(0);
    }
    let mut registry = workspace.load_registry()?;
    SchemaCompiler::with_config(&mut registry, workspace.compiler_config()).compile_all();

    let mut watcher = SchemaWatcher::new(workspace.schema_path());
    watcher.poll()?;
    tracing::info!(
        schema = %watcher.path().display(),
        interval = ?workspace.settings.poll_interval(),
        "watching schema"
    );

    let mut polls = 0u64;
    while args.polls.map_or(true, |limit| polls < limit) {
        std::thread::sleep(workspace.settings.poll_interval());
        polls += 1;
        match watcher.poll()? {
            WatchEvent::Changed | WatchEvent::FirstSeen => {
                if let Err(e) = reload_and_compile(&mut registry, watcher.path(), workspace) {
                    tracing::warn!("reload failed, keeping previous registry: {e:#}");
                }
            }
            WatchEvent::Missing => tracing::warn!(schema = %watcher.path().display(), "schema file missing"),
            WatchEvent::Unchanged => {}
        }
    }
    Ok(0)
}
