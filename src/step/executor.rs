//! Sequential step executor
//!
//! Steps run one at a time. A step that times out is abandoned: its body
//! future is dropped at the deadline, attachments made before that point
//! stay in the log and nothing it would have done afterwards is recorded.
//! Timeouts and skips never stop the scenario; any other error does, and so
//! does a panicking body.

use futures_util::future::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use crate::common::config::RunnerConfig;
use crate::common::Error;

use super::context::StepContext;
use super::log::{ScenarioLog, StepFailure, StepRecord, StepStatus};
use super::scenario::{Scenario, StepSpec};

/// Run every step of `scenario` in order
pub async fn run_scenario(scenario: &Scenario) -> ScenarioLog {
    execute(scenario, None).await
}

/// Run a scenario, falling back to the configured default step timeout
pub async fn run_scenario_with_config(scenario: &Scenario, config: &RunnerConfig) -> ScenarioLog {
    execute(scenario, config.default_step_timeout()).await
}

async fn execute(scenario: &Scenario, fallback_timeout: Option<Duration>) -> ScenarioLog {
    let mut log = ScenarioLog::new(&scenario.name, scenario.annotations.clone());
    let default_timeout = scenario.default_step_timeout.or(fallback_timeout);

    tracing::info!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");

    for (index, step) in scenario.steps.iter().enumerate() {
        let span = tracing::info_span!("step", scenario = %scenario.name, step = %step.name);
        let record = run_step(index, step, default_timeout)
            .instrument(span)
            .await;
        let failed = record.status == StepStatus::Failed;
        log.push(record);

        if failed {
            let remaining = scenario.steps[index + 1..].iter().map(|s| s.name.clone());
            log.mark_not_run(remaining);
            tracing::warn!(scenario = %scenario.name, step = %step.name, "Scenario stopped by failed step");
            break;
        }
    }

    tracing::info!(
        scenario = %scenario.name,
        success = log.is_success(),
        "Scenario finished"
    );
    log
}

async fn run_step(index: usize, step: &StepSpec, default_timeout: Option<Duration>) -> StepRecord {
    let timeout = step.timeout.or(default_timeout);
    let mut record = StepRecord {
        index,
        name: step.name.clone(),
        status: StepStatus::Pending,
        skip_reason: None,
        attachments: Vec::new(),
        timeout_ms: timeout.map(|t| t.as_millis() as u64),
        duration_ms: 0,
        error: None,
    };

    if let Some(reason) = step.skip_reason() {
        tracing::info!(reason = %reason, "Step skipped");
        record.status = StepStatus::Skipped;
        record.skip_reason = Some(reason);
        return record;
    }

    record.status = StepStatus::Running;
    tracing::debug!("Step started");

    let ctx = StepContext::new(&step.name);
    let started = Instant::now();
    let body = AssertUnwindSafe(step.start(ctx.clone()))
        .catch_unwind()
        .map(|caught| caught.unwrap_or_else(|payload| Err(panic_error(payload))));

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, body).await {
            Ok(result) => result,
            Err(_) => Err(Error::StepTimeout {
                step: step.name.clone(),
                timeout_ms: limit.as_millis() as u64,
            }),
        },
        None => body.await,
    };

    record.duration_ms = started.elapsed().as_millis() as u64;
    record.attachments = ctx.take_attachments();

    match outcome {
        Ok(()) => {
            tracing::info!(duration_ms = record.duration_ms, "Step completed");
            record.status = StepStatus::Completed;
        }
        Err(Error::SkipRequested(reason)) => {
            tracing::info!(reason = %reason, "Step skipped from its body");
            record.status = StepStatus::Skipped;
            record.skip_reason = Some(reason);
            // skipped steps never carry attachments
            record.attachments.clear();
        }
        Err(err @ Error::StepTimeout { .. }) => {
            tracing::warn!(error = %err, "Step timed out, continuing");
            record.status = StepStatus::TimedOut;
            record.error = Some(StepFailure::from(&err));
        }
        Err(err) => {
            tracing::error!(error = %err, causes = ?err.causes(), "Step failed");
            record.status = StepStatus::Failed;
            record.error = Some(StepFailure::from(&err));
        }
    }

    record
}

fn panic_error(payload: Box<dyn Any + Send>) -> Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    Error::Internal(format!("step panicked: {}", message))
}
