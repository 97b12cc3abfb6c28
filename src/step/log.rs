//! Scenario log
//!
//! The executor appends one record per step once that step reaches a
//! terminal state. Callers only get read access.

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorKind, Result};
use crate::snapshot::MatchResult;

/// Lifecycle of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Skipped,
    TimedOut,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Pending | StepStatus::Running)
    }
}

/// Named artifact attached by a step body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub body: String,
    pub content_type: String,
}

/// Free-form label on a scenario, e.g. `issue` or `feature`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// Error recorded for a timed-out or failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Underlying errors, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<MatchResult>,
}

impl From<&Error> for StepFailure {
    fn from(err: &Error) -> Self {
        let mismatch = match err {
            Error::AssertionMismatch(result) => Some(result.as_ref().clone()),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            causes: err.causes(),
            mismatch,
        }
    }
}

/// Terminal record of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position among the scenario's declared steps
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

/// Ordered record of one scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioLog {
    scenario: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
    steps: Vec<StepRecord>,
    /// Declared steps that never started because an earlier step failed
    #[serde(default)]
    not_run: Vec<String>,
}

impl ScenarioLog {
    pub(crate) fn new(scenario: &str, annotations: Vec<Annotation>) -> Self {
        Self {
            scenario: scenario.to_string(),
            annotations,
            steps: Vec::new(),
            not_run: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        debug_assert!(record.status.is_terminal());
        self.steps.push(record);
    }

    pub(crate) fn mark_not_run(&mut self, names: impl IntoIterator<Item = String>) {
        self.not_run.extend(names);
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// First record with the given step name
    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn with_status(&self, status: StepStatus) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |s| s.status == status)
    }

    pub fn with_attachments(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.attachments.is_empty())
    }

    /// The step that stopped the scenario, if any
    pub fn failure(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    pub fn not_run(&self) -> &[String] {
        &self.not_run
    }

    /// True when no step failed; skipped and timed-out steps do not count
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, name: &str, status: StepStatus) -> StepRecord {
        StepRecord {
            index,
            name: name.to_string(),
            status,
            skip_reason: None,
            attachments: Vec::new(),
            timeout_ms: None,
            duration_ms: 0,
            error: None,
        }
    }

    #[test]
    fn test_queries() {
        let mut log = ScenarioLog::new("queries", Vec::new());
        let mut first = record(0, "prepare", StepStatus::Completed);
        first.attachments.push(Attachment {
            name: "page-state".into(),
            body: "{}".into(),
            content_type: "application/json".into(),
        });
        log.push(first);
        log.push(record(1, "mobile only", StepStatus::Skipped));
        log.push(record(2, "wait", StepStatus::TimedOut));

        assert_eq!(log.step("wait").map(|s| s.index), Some(2));
        assert!(log.step("missing").is_none());
        assert_eq!(log.with_status(StepStatus::Skipped).count(), 1);
        assert_eq!(log.with_attachments().count(), 1);
        assert!(log.is_success());
    }

    #[test]
    fn test_failure_and_json_export() {
        let mut log = ScenarioLog::new(
            "export",
            vec![Annotation {
                kind: "issue".into(),
                description: "https://github.com/org/repo/issues/123".into(),
            }],
        );
        let mut failed = record(0, "login", StepStatus::Failed);
        let err = Error::action_caused_by("Wrapper error", Error::action("Original error"));
        failed.error = Some(StepFailure::from(&err));
        log.push(failed);
        log.mark_not_run(["logout".to_string()]);

        assert!(!log.is_success());
        assert_eq!(log.failure().map(|s| s.name.as_str()), Some("login"));

        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(json["annotations"][0]["type"], "issue");
        assert_eq!(json["steps"][0]["status"], "failed");
        assert_eq!(json["steps"][0]["error"]["kind"], "action_error");
        assert_eq!(json["steps"][0]["error"]["causes"][0], "Original error");
        assert_eq!(json["not_run"][0], "logout");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StepStatus::Pending.is_terminal());
        assert!(!StepStatus::Running.is_terminal());
        assert!(StepStatus::TimedOut.is_terminal());
    }
}
