//! Error types for stepwright
//!
//! Step bodies, the snapshot parser and the scenario file loader all report
//! through the same enum so that the executor can classify whatever a body
//! returns without downcasting.

use std::io;
use thiserror::Error;

use crate::snapshot::MatchResult;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stepwright
#[derive(Error, Debug)]
pub enum Error {
    // === Step Control ===
    /// Not a failure: the step asked to be skipped
    #[error("Step skipped: {0}")]
    SkipRequested(String),

    #[error("Step '{step}' timed out after {timeout_ms}ms")]
    StepTimeout { step: String, timeout_ms: u64 },

    // === Assertion Errors ===
    #[error("Snapshot mismatch at {}: expected {}, got {}", .0.breadcrumbs(), .0.expected, .0.actual)]
    AssertionMismatch(Box<MatchResult>),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    // === Action Errors ===
    #[error("{message}")]
    Action {
        message: String,
        #[source]
        cause: Option<Box<Error>>,
    },

    // === Snapshot Grammar Errors ===
    #[error("Invalid snapshot template near '{near}': {message}")]
    SnapshotParse { near: String, message: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification recorded in the scenario log
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SkipRequested,
    StepTimeout,
    AssertionMismatch,
    ActionError,
    Other,
}

impl Error {
    /// Create an action error without an underlying cause
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap an existing error as the cause of a new action error
    pub fn action_caused_by(message: impl Into<String>, cause: Error) -> Self {
        Self::Action {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Create a snapshot grammar error
    pub fn snapshot_parse(near: &str, message: impl Into<String>) -> Self {
        Self::SnapshotParse {
            near: near.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SkipRequested(_) => ErrorKind::SkipRequested,
            Error::StepTimeout { .. } => ErrorKind::StepTimeout,
            Error::AssertionMismatch(_) | Error::Assertion(_) => ErrorKind::AssertionMismatch,
            Error::Action { .. } => ErrorKind::ActionError,
            _ => ErrorKind::Other,
        }
    }

    /// Messages of every error below this one, outermost first
    pub fn causes(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_chain_is_preserved() {
        let original = Error::action("Original error");
        let wrapper = Error::action_caused_by("Wrapper error", original);

        assert_eq!(wrapper.to_string(), "Wrapper error");
        assert_eq!(wrapper.causes(), vec!["Original error".to_string()]);
        assert_eq!(wrapper.kind(), ErrorKind::ActionError);
    }

    #[test]
    fn test_nested_causes_walk_outermost_first() {
        let err = Error::action_caused_by(
            "login failed",
            Error::action_caused_by("request failed", Error::Internal("socket closed".into())),
        );
        assert_eq!(
            err.causes(),
            vec![
                "request failed".to_string(),
                "Internal error: socket closed".to_string()
            ]
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::SkipRequested("x".into()).kind(), ErrorKind::SkipRequested);
        assert_eq!(
            Error::StepTimeout { step: "s".into(), timeout_ms: 5 }.kind(),
            ErrorKind::StepTimeout
        );
        assert_eq!(Error::Assertion("x".into()).kind(), ErrorKind::AssertionMismatch);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Other);
    }
}
