//! podbuild CLI entry point.
//!
//! Parses command-line arguments, executes the requested command and turns
//! any failure into a user-friendly message with a per-kind suggestion and
//! a non-zero exit status.

use anyhow::Result;
use clap::Parser;
use podbuild_cli::cli;
use podbuild_cli::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
