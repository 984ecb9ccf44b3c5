//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod generate;
mod import;
mod info;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Paneldraft - widget layouts to and from display config dialects
#[derive(Parser)]
#[command(name = "pdraft")]
#[command(about = "Paneldraft - convert widget layout models to and from display config dialects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate display config text from a saved layout model
    Generate {
        /// Layout model file (JSON)
        input: PathBuf,

        /// Output dialect: lambda, declarative, json, yaml
        /// (aliases: esphome, lvgl, oepl, opendisplay)
        #[arg(short, long, default_value = "lambda")]
        dialect: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override which page to export (payload dialects only export one)
        #[arg(long)]
        page: Option<usize>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Import display config text into a layout model
    Import {
        /// Config text file (omit if using --stdin)
        #[arg(required_unless_present = "stdin")]
        input: Option<PathBuf>,

        /// Read input from stdin
        #[arg(long)]
        stdin: bool,

        /// Output model file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Summarize a layout model: device, pages, widgets, fonts
    Info {
        /// Layout model file (JSON)
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered widget types and their dialect support
    Plugins {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            dialect,
            output,
            page,
            strict,
        } => generate::run_generate(&input, &dialect, output.as_deref(), page, strict),
        Commands::Import {
            input,
            stdin,
            output,
            strict,
        } => import::run_import(input.as_deref(), stdin, output.as_deref(), strict),
        Commands::Info { input, json } => info::run_info(&input, json),
        Commands::Plugins { json } => info::run_plugins(json),
    }
}

/// Print warnings to stderr; returns how many there were.
pub(crate) fn report_warnings(warnings: &[crate::models::Warning]) -> usize {
    for warning in warnings {
        if warning.line > 0 {
            eprintln!("Warning (line {}): {}", warning.line, warning.message);
        } else {
            eprintln!("Warning: {}", warning.message);
        }
    }
    warnings.len()
}
