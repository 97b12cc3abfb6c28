//! Scenario files
//!
//! Reads declarative YAML scenarios whose steps act on a fixture page
//! snapshot and runs them through the step executor, so assertions are
//! made against structured trees rather than rendered strings.

mod config;
mod runner;

pub use config::*;
pub use runner::{discover, print_log, print_report, run_files, run_scenario_file};
