//! `tern` - command-line driver for the module type-graph builder.
//!
//! Reads a parsed module (ESTree-style JSON, as emitted by the upstream
//! parser), builds its type graph, and reports diagnostics. Exits
//! non-zero when any error-category diagnostic was produced.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tern_ast::Node;
use tern_common::DiagnosticCategory;
use tern_graph::build_module_scope;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tern", about = "Static type inference for Tern modules")]
struct Cli {
    /// Path to the module's parsed AST (JSON).
    ast: PathBuf,

    /// Dump the resulting module scope graph as JSON on stdout.
    #[arg(long)]
    dump_graph: bool,
}

fn run(cli: &Cli) -> Result<bool> {
    let text = std::fs::read_to_string(&cli.ast)
        .with_context(|| format!("failed to read {}", cli.ast.display()))?;
    let ast: Node = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a parsed module", cli.ast.display()))?;

    let (module, diagnostics) = build_module_scope(ast).context("module build aborted")?;

    let mut failed = false;
    for diagnostic in &diagnostics {
        let severity = match diagnostic.category {
            DiagnosticCategory::Error => {
                failed = true;
                "error"
            }
            DiagnosticCategory::Warning => "warning",
        };
        eprintln!("{severity}: {diagnostic}");
    }
    tracing::info!(count = diagnostics.len(), "diagnostics reported");

    if cli.dump_graph {
        let rendered =
            serde_json::to_string_pretty(&module).context("failed to serialize module scope")?;
        println!("{rendered}");
    }
    Ok(failed)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
