//! pdraft - command-line tool for converting widget layout models to
//! and from display configuration text.

use std::process::ExitCode;

use paneldraft::cli;

fn main() -> ExitCode {
    cli::run()
}
