//! Suite runner with retries and flaky detection

use serde::Serialize;

use crate::common::config::RunnerConfig;

use super::executor::run_scenario_with_config;
use super::log::ScenarioLog;
use super::scenario::Suite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed,
    /// Failed at least once, then passed on a retry
    Flaky,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: ScenarioOutcome,
    /// One log per attempt, in order
    pub attempts: Vec<ScenarioLog>,
}

impl ScenarioReport {
    /// Log of the last attempt
    pub fn final_log(&self) -> Option<&ScenarioLog> {
        self.attempts.last()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub scenarios: Vec<ScenarioReport>,
    pub fail_on_flaky: bool,
}

impl SuiteReport {
    pub fn count(&self, outcome: ScenarioOutcome) -> usize {
        self.scenarios.iter().filter(|s| s.outcome == outcome).count()
    }

    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(|s| match s.outcome {
            ScenarioOutcome::Passed => true,
            ScenarioOutcome::Flaky => !self.fail_on_flaky,
            ScenarioOutcome::Failed => false,
        })
    }
}

/// Run each scenario of `suite`, retrying failures up to `config.retries` times
pub async fn run_suite(suite: &Suite, config: &RunnerConfig) -> SuiteReport {
    let mut reports = Vec::with_capacity(suite.scenarios.len());

    for scenario in &suite.scenarios {
        let mut attempts = Vec::new();
        let mut outcome = ScenarioOutcome::Failed;

        for attempt in 0..=config.retries {
            if attempt > 0 {
                tracing::info!(scenario = %scenario.name, attempt, "Retrying scenario");
            }
            let log = run_scenario_with_config(scenario, config).await;
            let passed = log.is_success();
            attempts.push(log);

            if passed {
                outcome = if attempt == 0 {
                    ScenarioOutcome::Passed
                } else {
                    ScenarioOutcome::Flaky
                };
                break;
            }
        }

        if outcome == ScenarioOutcome::Flaky {
            tracing::warn!(scenario = %scenario.name, "Scenario is flaky");
        }

        reports.push(ScenarioReport {
            name: scenario.name.clone(),
            outcome,
            attempts,
        });
    }

    SuiteReport {
        name: suite.name.clone(),
        scenarios: reports,
        fail_on_flaky: config.fail_on_flaky,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::step::{Scenario, StepSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fails_first_time() -> Scenario {
        let calls = Arc::new(AtomicUsize::new(0));
        Scenario::new("flaky").step(StepSpec::new("sometimes", move |_| {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::action("first attempt fails"))
                } else {
                    Ok(())
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_retry_marks_flaky() {
        let suite = Suite::new("retries")
            .scenario(Scenario::new("stable").step(StepSpec::new("ok", |_| async { Ok(()) })))
            .scenario(fails_first_time());
        let config = RunnerConfig {
            retries: 2,
            ..RunnerConfig::default()
        };

        let report = run_suite(&suite, &config).await;
        assert_eq!(report.scenarios[0].outcome, ScenarioOutcome::Passed);
        assert_eq!(report.scenarios[1].outcome, ScenarioOutcome::Flaky);
        assert_eq!(report.scenarios[1].attempts.len(), 2);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_fail_on_flaky() {
        let suite = Suite::new("strict").scenario(fails_first_time());
        let config = RunnerConfig {
            retries: 1,
            fail_on_flaky: true,
            ..RunnerConfig::default()
        };

        let report = run_suite(&suite, &config).await;
        assert_eq!(report.count(ScenarioOutcome::Flaky), 1);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_no_retries_means_failure() {
        let suite = Suite::new("no retries").scenario(fails_first_time());
        let report = run_suite(&suite, &RunnerConfig::default()).await;
        assert_eq!(report.scenarios[0].outcome, ScenarioOutcome::Failed);
        assert_eq!(report.scenarios[0].attempts.len(), 1);
        assert!(!report.scenarios[0].final_log().unwrap().is_success());
    }
}
