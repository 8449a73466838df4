//! # cforge CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Logs go to stderr so JSON printed on stdout stays machine-readable.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cforge_cli::compile::{run_compile, CompileArgs};
use cforge_cli::defaults::{run_defaults, DefaultsArgs};
use cforge_cli::edit::{run_edit, EditArgs};
use cforge_cli::watch::{run_watch, WatchArgs};
use cforge_cli::Workspace;

/// Component schema compiler.
///
/// Turns a reflection registry schema into editable field groups, prints
/// default component values, and applies edits to stored components.
#[derive(Parser, Debug)]
#[command(name = "cforge", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the YAML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile the schema and print the field group trees.
    Compile(CompileArgs),

    /// Print the default JSON of components.
    Defaults(DefaultsArgs),

    /// Edit a component stored in an item file.
    Edit(EditArgs),

    /// Recompile whenever the schema file changes.
    Watch(WatchArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let workspace = match Workspace::from_config(cli.config.as_deref()) {
        Ok(workspace) => workspace,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(base_dir = %workspace.base_dir.display(), "resolved workspace");

    let result = match cli.command {
        Commands::Compile(args) => run_compile(&args, &workspace),
        Commands::Defaults(args) => run_defaults(&args, &workspace),
        Commands::Edit(args) => run_edit(&args, &workspace),
        Commands::Watch(args) => run_watch(&args, &workspace),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
