//! stepwright - scenario runner with structured snapshot assertions
//!
//! Runs YAML scenarios step by step, compares accessibility-like snapshots
//! against templates and renders snapshot trees as text.

use clap::Parser;
use commands::Commands;
use std::path::PathBuf;
use stepwright::common::{config::Config, logging};
use stepwright::{cli, commands};

#[derive(Parser)]
#[command(name = "stepwright", about = "Step-based scenario runner with snapshot assertions")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Held until exit so the file writer flushes
    let _guard = if config.logging.file {
        logging::init_with_file(&config.logging).map(|(path, guard)| {
            tracing::debug!(path = %path.display(), "Logging to file");
            guard
        })
    } else {
        logging::init_cli(&config.logging);
        None
    };

    match cli::dispatch(cli.command, config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
