//! Step executor
//!
//! A [`Scenario`] is an ordered list of [`StepSpec`]s built explicitly and
//! handed to [`run_scenario`], which returns the [`ScenarioLog`] of terminal
//! step records. Step status moves Pending -> Running -> one of Completed,
//! Skipped, TimedOut or Failed.

mod context;
mod executor;
mod log;
mod scenario;
mod suite;

pub use context::StepContext;
pub use executor::{run_scenario, run_scenario_with_config};
pub use log::{Annotation, Attachment, ScenarioLog, StepFailure, StepRecord, StepStatus};
pub use scenario::{Scenario, SkipPredicate, StepBody, StepSpec, Suite};
pub use suite::{run_suite, ScenarioOutcome, ScenarioReport, SuiteReport};
