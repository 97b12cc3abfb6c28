//! Scenario file runner
//!
//! Turns YAML scenario files into [`Scenario`]s whose steps act on a fixed
//! page snapshot, runs them through the suite runner and prints the logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::common::config::{Config, OutputConfig, OutputFormat};
use crate::common::{Error, Result};
use crate::snapshot::{
    compare, render, ExpectedSnapshot, RenderOptions, SnapshotNode, SnapshotProducer, StaticPage,
    DOCUMENT_ROLE,
};
use crate::step::{
    run_scenario_with_config, run_suite, Scenario, ScenarioLog, ScenarioOutcome, StepSpec,
    StepStatus, Suite, SuiteReport,
};

use super::config::{StepAction, TestScenario, TestStep};

impl TestScenario {
    /// Parse a scenario from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse scenario '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// The fixture page; `page_tree` wins over `page` when both are given
    pub fn page(&self) -> Result<StaticPage> {
        let root = match (&self.page_tree, &self.page) {
            (Some(tree), _) => tree.clone(),
            (None, Some(text)) => SnapshotNode::parse_snapshot(text)?,
            (None, None) => SnapshotNode::new(DOCUMENT_ROLE),
        };
        Ok(StaticPage::new(root))
    }

    /// Build an executable scenario
    ///
    /// Templates and flag references are checked here so that a broken
    /// file fails before any step runs.
    pub fn to_scenario(&self) -> Result<Scenario> {
        let page = Arc::new(self.page()?);

        let mut scenario = Scenario::new(self.name.clone());
        scenario.annotations = self.annotations.clone();
        scenario.default_step_timeout = self.default_step_timeout_ms.map(Duration::from_millis);

        for step in &self.steps {
            let mut spec = build_step(step, &page)?;
            if let Some(ms) = step.timeout_ms {
                spec = spec.timeout(Duration::from_millis(ms));
            }
            if let Some(reason) = self.skip_reason(step)? {
                spec = spec.skip_when(true, reason);
            }
            scenario = scenario.step(spec);
        }

        Ok(scenario)
    }

    fn skip_reason(&self, step: &TestStep) -> Result<Option<String>> {
        let flag = |name: &str| {
            self.flags.get(name).copied().ok_or_else(|| {
                Error::Config(format!(
                    "Step '{}' refers to unknown flag '{}'",
                    step.name, name
                ))
            })
        };

        let skip = match (&step.skip_if, &step.skip_unless) {
            (Some(name), _) if flag(name)? => Some(format!("{} is enabled", name)),
            (_, Some(name)) if !flag(name)? => Some(format!("{} is not enabled", name)),
            _ => None,
        };
        Ok(skip.map(|default| step.reason.clone().unwrap_or(default)))
    }
}

fn build_step(step: &TestStep, page: &Arc<StaticPage>) -> Result<StepSpec> {
    let name = step.name.clone();

    let spec = match &step.action {
        StepAction::MatchSnapshot { locator, expected } => {
            let expected = Arc::new(ExpectedSnapshot::parse(expected)?);
            let page = page.clone();
            let locator = locator.clone();
            StepSpec::new(name, move |_| {
                let (page, expected, locator) = (page.clone(), expected.clone(), locator.clone());
                async move {
                    let actual = page.snapshot(locator.as_deref()).await?;
                    compare(&actual, &expected).into_result()
                }
            })
        }
        StepAction::ContainsText { locator, text } => {
            let page = page.clone();
            let (locator, text) = (locator.clone(), text.clone());
            StepSpec::new(name, move |_| {
                let (page, locator, text) = (page.clone(), locator.clone(), text.clone());
                async move {
                    let actual = page.snapshot(locator.as_deref()).await?.flattened_text();
                    if actual.contains(&text) {
                        Ok(())
                    } else {
                        Err(Error::Assertion(format!(
                            "Expected text containing '{}', got '{}'",
                            text, actual
                        )))
                    }
                }
            })
        }
        StepAction::Sleep { ms } => {
            let duration = Duration::from_millis(*ms);
            StepSpec::new(name, move |_| async move {
                tokio::time::sleep(duration).await;
                Ok(())
            })
        }
        StepAction::Attach {
            attachment,
            body,
            content_type,
        } => {
            let (attachment, body, content_type) =
                (attachment.clone(), body.clone(), content_type.clone());
            StepSpec::new(name, move |ctx| {
                ctx.attach(attachment.clone(), body.clone(), content_type.clone());
                async { Ok(()) }
            })
        }
        StepAction::AttachSnapshot {
            attachment,
            locator,
            refs,
        } => {
            let page = page.clone();
            let (attachment, locator, refs) = (attachment.clone(), locator.clone(), *refs);
            StepSpec::new(name, move |ctx| {
                let (page, attachment, locator) =
                    (page.clone(), attachment.clone(), locator.clone());
                async move {
                    let node = page.snapshot(locator.as_deref()).await?;
                    let text = render(&node, RenderOptions { refs });
                    ctx.attach(attachment, text, "text/yaml");
                    Ok(())
                }
            })
        }
        StepAction::Fail { message, cause } => {
            let (message, cause) = (message.clone(), cause.clone());
            StepSpec::new(name, move |_| {
                let err = match &cause {
                    Some(cause) => Error::action_caused_by(message.clone(), Error::action(cause.clone())),
                    None => Error::action(message.clone()),
                };
                async move { Err(err) }
            })
        }
        StepAction::Log { message } => {
            let message = message.clone();
            StepSpec::new(name, move |ctx| {
                tracing::info!(step = ctx.step_name(), "{}", message);
                async { Ok(()) }
            })
        }
    };

    Ok(spec)
}

/// Collect scenario files from files and directories (one level deep)
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
                })
                .collect::<Vec<_>>();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    if files.is_empty() {
        return Err(Error::Config("No scenario files found".to_string()));
    }
    Ok(files)
}

/// Run a single scenario file
pub async fn run_scenario_file(path: &Path, config: &Config) -> Result<ScenarioLog> {
    let scenario = TestScenario::load(path)?.to_scenario()?;
    Ok(run_scenario_with_config(&scenario, &config.runner).await)
}

/// Load every file into one suite and run it with the configured retries
pub async fn run_files(paths: &[PathBuf], config: &Config) -> Result<SuiteReport> {
    let mut suite = Suite::new("scenarios");
    for path in discover(paths)? {
        tracing::debug!(path = %path.display(), "Loading scenario");
        suite = suite.scenario(TestScenario::load(&path)?.to_scenario()?);
    }
    Ok(run_suite(&suite, &config.runner).await)
}

/// Print a suite report in the configured format
pub fn print_report(report: &SuiteReport, output: &OutputConfig) -> Result<()> {
    if output.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for scenario in &report.scenarios {
        if let Some(log) = scenario.final_log() {
            print_log(log, output.verbose);
        }
        match scenario.outcome {
            ScenarioOutcome::Passed => {}
            ScenarioOutcome::Flaky => println!(
                "  {} passed after {} attempts",
                "flaky:".yellow().bold(),
                scenario.attempts.len()
            ),
            ScenarioOutcome::Failed if scenario.attempts.len() > 1 => println!(
                "  {} failed in all {} attempts",
                "retries:".red(),
                scenario.attempts.len()
            ),
            ScenarioOutcome::Failed => {}
        }
    }

    let summary = format!(
        "{} passed, {} flaky, {} failed",
        report.count(ScenarioOutcome::Passed),
        report.count(ScenarioOutcome::Flaky),
        report.count(ScenarioOutcome::Failed)
    );
    if report.is_success() {
        println!("\n{} {}\n", "✓".green().bold(), summary.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), summary.red().bold());
    }
    Ok(())
}

/// Print one scenario log as a step list
pub fn print_log(log: &ScenarioLog, verbose: bool) {
    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        log.scenario().white().bold()
    );
    for annotation in log.annotations() {
        println!("  @{} {}", annotation.kind, annotation.description.dimmed());
    }

    println!("\n{}", "Steps:".cyan());
    for record in log.steps() {
        let number = record.index + 1;
        match record.status {
            StepStatus::Completed => println!(
                "  {} Step {}: {} {}",
                "✓".green(),
                number,
                record.name,
                format!("({}ms)", record.duration_ms).dimmed()
            ),
            StepStatus::Skipped => println!(
                "  {} Step {}: {} {}",
                "-".yellow(),
                number,
                record.name,
                format!(
                    "(skipped: {})",
                    record.skip_reason.as_deref().unwrap_or("no reason")
                )
                .dimmed()
            ),
            StepStatus::TimedOut => println!(
                "  {} Step {}: {} {}",
                "⏱".yellow(),
                number,
                record.name,
                format!("(timed out after {}ms)", record.timeout_ms.unwrap_or(0)).yellow()
            ),
            StepStatus::Failed => {
                println!("  {} Step {}: {}", "✗".red(), number, record.name);
                if let Some(error) = &record.error {
                    println!("      {}", error.message.red());
                    for cause in &error.causes {
                        println!("      {} {}", "caused by:".dimmed(), cause);
                    }
                }
            }
            StepStatus::Pending | StepStatus::Running => {}
        }

        if verbose {
            for attachment in &record.attachments {
                println!(
                    "      {} {} ({}, {} bytes)",
                    "attachment".dimmed(),
                    attachment.name,
                    attachment.content_type,
                    attachment.body.len()
                );
            }
        }
    }

    for name in log.not_run() {
        println!("  {} {}", "·".dimmed(), format!("{} (not run)", name).dimmed());
    }
}
