//! Import command implementation

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use super::{report_warnings, EXIT_ERROR, EXIT_SUCCESS};
use crate::import;
use crate::plugins::PluginRegistry;

/// Execute the import command
pub fn run_import(
    input: Option<&Path>,
    stdin: bool,
    output: Option<&Path>,
    strict: bool,
) -> ExitCode {
    let text = if stdin {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("Error: Failed to read stdin: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        buf
    } else {
        // clap guarantees input is present when --stdin is absent
        let path = input.expect("input required without --stdin");
        match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: Failed to read '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    };

    let result = match import::parse_layout(&text, PluginRegistry::shared()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let warning_count = report_warnings(&result.warnings);
    if strict && warning_count > 0 {
        eprintln!("Error: {} warning(s) in strict mode", warning_count);
        return ExitCode::from(EXIT_ERROR);
    }

    let json = match serde_json::to_string_pretty(&result.layout) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &json) {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            eprintln!(
                "Imported: {} ({} pages, {} widgets)",
                path.display(),
                result.layout.pages.len(),
                result.layout.widget_count()
            );
        }
        None => println!("{}", json),
    }
    ExitCode::from(EXIT_SUCCESS)
}
