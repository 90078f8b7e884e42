//! Tabula - load a sheet, apply edits, print or export the recalculated result.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tabula_core::Document;
use tabula_core::storage::write_markdown_content;
use tabula_engine::builtins::{BUILTINS, CONSTANTS};

use commands::Command;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(
    author,
    version,
    about = "Cell formula evaluation and recalculation",
    after_help = "Commands: A1 = <input>, clear A1, insert-row N [after], delete-row N, \
                  insert-col B [after], delete-col B, width B 20, copy A1 B2, refresh"
)]
struct Cli {
    /// Sheet to open (.tbl or .csv); created on --save if missing
    file: Option<PathBuf>,

    /// Edit command to apply, in order (can be repeated)
    #[arg(short, long = "command", value_name = "COMMAND")]
    commands: Vec<String>,

    /// Write the result to this file (.tbl, .csv or .md) instead of printing it
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save back to FILE after applying commands
    #[arg(short, long, requires = "file")]
    save: bool,

    /// Print the builtin functions and constants, then exit
    #[arg(long)]
    functions: bool,

    /// Use this config file instead of the one in the user config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.functions {
        print_functions();
        return Ok(());
    }

    let (config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut doc = Document::with_file(cli.file.clone()).with_context(|| {
        format!(
            "Failed to open '{}'",
            cli.file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        )
    })?;
    config.apply_to(&mut doc);

    for raw in &cli.commands {
        let command: Command = raw
            .parse()
            .with_context(|| format!("Invalid command '{}'", raw))?;
        command.apply(&mut doc);
    }

    if cli.save {
        let path = doc.save_file().context("Failed to save")?;
        eprintln!("Saved to {}", path.display());
    }

    if let Some(output) = &cli.output {
        doc.save_as(output)
            .with_context(|| format!("Failed to write '{}'", output.display()))?;
        println!("Exported to {}", output.display());
    } else {
        print!("{}", write_markdown_content(&doc, doc.precision));
    }

    if report_errors(&doc) > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// List errored cells on stderr, row-major. Returns how many there were.
fn report_errors(doc: &Document) -> usize {
    let mut errored: Vec<_> = doc
        .grid
        .iter()
        .filter_map(|entry| {
            entry
                .error
                .as_ref()
                .map(|err| (entry.key().clone(), err.message.clone()))
        })
        .collect();
    errored.sort();

    for (cell, message) in &errored {
        eprintln!("{}: {}", cell, message);
    }
    errored.len()
}

fn print_functions() {
    let width = BUILTINS.iter().map(|b| b.name.len()).max().unwrap_or(0);
    println!("Functions:");
    for builtin in BUILTINS {
        println!(
            "  {:<width$}  {:<22}  {}",
            builtin.name,
            builtin.arity.to_string(),
            builtin.description,
            width = width
        );
    }
    println!();
    println!("Constants:");
    for constant in CONSTANTS {
        println!(
            "  {:<width$}  {}",
            constant.name,
            constant.description,
            width = width
        );
    }
}
