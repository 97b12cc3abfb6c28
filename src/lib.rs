//! stepwright - step-based scenario runner with snapshot assertions
//!
//! The library has three parts:
//!
//! - [`snapshot`]: an accessibility-like tree, a template grammar for the
//!   expected shape of that tree and a matcher that reports where they differ
//! - [`step`]: a sequential executor with per-step timeouts, skips and
//!   attachments, recording everything in a [`step::ScenarioLog`]
//! - [`testing`]: declarative YAML scenarios driving the two above

pub mod cli;
pub mod commands;
pub mod common;
pub mod snapshot;
pub mod step;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, ErrorKind, Result};
pub use snapshot::{compare, compare_text, ExpectedSnapshot, MatchResult, SnapshotNode};
pub use step::{run_scenario, Scenario, ScenarioLog, StepContext, StepSpec, StepStatus};
