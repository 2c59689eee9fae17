//! Command-line interface for podbuild.
//!
//! One subcommand, `build`, drives the whole pipeline: it takes one or more
//! pod names (or `*` for every buildable pod), plans the build, runs the
//! external build per group and reconciles the persisted manifests. Global
//! flags control verbosity and the project directory.

pub mod build;

pub use build::BuildCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Build planner for prebuilding a subset of a project's dependency pods.
#[derive(Parser)]
#[command(name = "podbuild", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Project directory to operate in (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prebuild the named pods (or `*` for all buildable pods).
    Build(build::BuildCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);

        let project_root = match self.project_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        match self.command {
            Commands::Build(cmd) => cmd.execute(&project_root),
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // ignore the error when a test harness already installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
