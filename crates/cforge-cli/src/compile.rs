//! # Compile Subcommand
//!
//! Compiles every top-level definition (or one component), prints the
//! resulting group trees, then the diagnostics.
//!
//! Exit code 1 when a requested component fails, or when `--strict` is
//! given and any diagnostic was recorded.

use anyhow::Result;
use clap::Args;
use cforge_compiler::SchemaCompiler;

use crate::render::render_group;
use crate::Workspace;

/// Arguments for `cforge compile`.
#[derive(Args, Debug, Default)]
pub struct CompileArgs {
    /// Compile only this component (long name).
    #[arg(long)]
    pub component: Option<String>,

    /// Fail when any diagnostic is recorded.
    #[arg(long)]
    pub strict: bool,

    /// Print only the summary and diagnostics.
    #[arg(long, short)]
    pub quiet: bool,
}

/// Text report and exit code of a compile run.
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub output: String,
    pub exit_code: u8,
}

pub fn compile_report(args: &CompileArgs, workspace: &Workspace) -> Result<CompileReport> {
    let mut registry = workspace.load_registry()?;
    let mut output = String::new();
    let mut exit_code = 0;

    let mut compiler = SchemaCompiler::with_config(&mut registry, workspace.compiler_config());
    let handles = match &args.component {
        Some(component) => match compiler.compile_component(component) {
            Some(handle) => vec![handle],
            None => {
                exit_code = 1;
                Vec::new()
            }
        },
        None => {
            let names = compiler.registry().top_level_names().to_vec();
            names
                .iter()
                .filter_map(|name| compiler.compile_component(name))
                .collect()
        }
    };

    if !args.quiet {
        for handle in &handles {
            output.push_str(&render_group(handle));
        }
    }
    output.push_str(&format!(
        "compiled {} component(s), {} group(s) registered\n",
        handles.len(),
        registry.registered_count()
    ));

    let diagnostics = registry.diagnostics();
    if !diagnostics.is_empty() {
        output.push_str(&diagnostics.to_string());
        if args.strict {
            exit_code = 1;
        }
    }
    Ok(CompileReport { output, exit_code })
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs, workspace: &Workspace) -> Result<u8> {
    let report = compile_report(args, workspace)?;
    print!("{}", report.output);
    Ok(report.exit_code)
}
