//! CLI command definitions
//!
//! Defines the clap commands for the stepwright CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenario files (or every .yaml file in a directory)
    Run {
        /// Scenario files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Show attachments and skip reasons for every step
        #[arg(long, short)]
        verbose: bool,

        /// Re-run failed scenarios up to this many times
        #[arg(long)]
        retries: Option<u32>,

        /// Timeout for steps that do not declare their own (milliseconds)
        #[arg(long)]
        step_timeout: Option<u64>,

        /// Fail the run when a scenario only passed on retry
        #[arg(long)]
        fail_on_flaky: bool,
    },

    /// Compare a snapshot against an expected template
    Compare {
        /// Actual snapshot: snapshot text, or a JSON tree when the extension is .json
        actual: PathBuf,

        /// Expected snapshot template
        expected: PathBuf,

        /// Print the match result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a snapshot tree as snapshot text
    Render {
        /// Snapshot text, or a JSON tree when the extension is .json
        tree: PathBuf,

        /// Add `[ref=eN]` markers to element lines
        #[arg(long)]
        refs: bool,
    },
}
