//! Generate command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{report_warnings, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::export::{self, Dialect, ExportSession};
use crate::loader;
use crate::plugins::PluginRegistry;

/// Execute the generate command
pub fn run_generate(
    input: &Path,
    dialect: &str,
    output: Option<&Path>,
    page: Option<usize>,
    strict: bool,
) -> ExitCode {
    let dialect = match dialect.parse::<Dialect>() {
        Ok(d) => d,
        Err(_) => {
            let names: Vec<&str> = Dialect::ALL.iter().map(Dialect::name).collect();
            eprintln!(
                "Error: unknown dialect '{dialect}' (expected one of: {})",
                names.join(", ")
            );
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let registry = PluginRegistry::shared();
    let loaded = match loader::load_model_file(input, registry) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let mut layout = loaded.layout;
    let mut warning_count = report_warnings(&loaded.warnings);

    if let Some(page) = page {
        if page >= layout.pages.len() {
            eprintln!(
                "Error: page {} out of range (model has {})",
                page,
                layout.pages.len()
            );
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        layout.current_page_index = page;
    }

    let mut session = ExportSession::new(registry);
    let text = match export::generate(&layout, dialect, &mut session) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    warning_count += report_warnings(&session.warnings);

    if strict && warning_count > 0 {
        eprintln!("Error: {} warning(s) in strict mode", warning_count);
        return ExitCode::from(EXIT_ERROR);
    }

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            eprintln!(
                "Generated: {} ({} dialect, {} widgets)",
                path.display(),
                dialect,
                layout.widget_count()
            );
        }
        None => print!("{}", text),
    }
    ExitCode::from(EXIT_SUCCESS)
}
