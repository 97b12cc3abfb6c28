//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::snapshot::SnapshotNode;
use crate::step::Annotation;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Labels copied into the scenario log
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Feature flags referenced by `skip_if` / `skip_unless`
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    /// Fixture page as snapshot text
    pub page: Option<String>,
    /// Fixture page as a structured tree
    pub page_tree: Option<SnapshotNode>,
    /// Timeout for steps without their own
    pub default_step_timeout_ms: Option<u64>,
    /// The sequence of steps to execute
    pub steps: Vec<TestStep>,
}

/// A single step in the scenario
///
/// The action's fields sit next to the step's own keys, so action fields
/// never reuse `name`, `timeout_ms`, `skip_if`, `skip_unless` or `reason`.
#[derive(Deserialize, Debug)]
pub struct TestStep {
    pub name: String,
    pub timeout_ms: Option<u64>,
    /// Skip when this flag is true
    pub skip_if: Option<String>,
    /// Skip when this flag is false or missing
    pub skip_unless: Option<String>,
    /// Reason recorded for a skip
    pub reason: Option<String>,
    #[serde(flatten)]
    pub action: StepAction,
}

/// What a step does
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Compare the page (or the first node with role `locator`) against a template
    MatchSnapshot {
        locator: Option<String>,
        expected: String,
    },
    /// Check the flattened text of the page or locator
    ContainsText {
        locator: Option<String>,
        text: String,
    },
    /// Wait, typically to exercise step timeouts
    Sleep { ms: u64 },
    /// Attach a literal artifact
    Attach {
        attachment: String,
        body: String,
        #[serde(default = "default_content_type")]
        content_type: String,
    },
    /// Attach the rendered snapshot of the page or locator
    AttachSnapshot {
        attachment: String,
        locator: Option<String>,
        #[serde(default)]
        refs: bool,
    },
    /// Fail with an action error, optionally wrapping a cause
    Fail {
        message: String,
        cause: Option<String>,
    },
    /// Write a message to the log
    Log { message: String },
}

fn default_content_type() -> String {
    "text/plain".to_string()
}
