//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

use colored::Colorize;
use std::path::Path;

use crate::commands::Commands;
use crate::common::config::{Config, OutputFormat};
use crate::common::{Error, Result};
use crate::snapshot::{compare, render, ExpectedSnapshot, RenderOptions, SnapshotNode};
use crate::testing;

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command ran but its verdict is a failure
/// (a failed scenario or a snapshot mismatch).
pub async fn dispatch(command: Commands, mut config: Config) -> Result<bool> {
    match command {
        Commands::Run {
            paths,
            json,
            verbose,
            retries,
            step_timeout,
            fail_on_flaky,
        } => {
            if json {
                config.output.format = OutputFormat::Json;
            }
            config.output.verbose |= verbose;
            config.runner.fail_on_flaky |= fail_on_flaky;
            if let Some(retries) = retries {
                config.runner.retries = retries;
            }
            if step_timeout.is_some() {
                config.runner.default_step_timeout_ms = step_timeout;
            }

            let report = testing::run_files(&paths, &config).await?;
            testing::print_report(&report, &config.output)?;
            Ok(report.is_success())
        }

        Commands::Compare {
            actual,
            expected,
            json,
        } => {
            let actual = load_tree(&actual)?;
            let template = read_file(&expected)?;
            let expected = ExpectedSnapshot::parse(&template)?;
            let result = compare(&actual, &expected);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.ok {
                println!("{} Snapshot matches", "✓".green().bold());
            } else {
                println!("{} Snapshot mismatch", "✗".red().bold());
                println!("  {} {}", "at:".cyan(), result.breadcrumbs());
                println!("  {} {}", "expected:".cyan(), result.expected);
                println!("  {} {}", "actual:".cyan(), result.actual);
            }
            Ok(result.ok)
        }

        Commands::Render { tree, refs } => {
            let node = load_tree(&tree)?;
            print!("{}", render(&node, RenderOptions { refs }));
            Ok(true)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// Load a tree from JSON (by extension) or from snapshot text
fn load_tree(path: &Path) -> Result<SnapshotNode> {
    let content = read_file(path)?;
    if path.extension().map(|ext| ext == "json").unwrap_or(false) {
        Ok(serde_json::from_str(&content)?)
    } else {
        SnapshotNode::parse_snapshot(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_tree_from_json() {
        let file = write_temp(
            ".json",
            r#"{"role":"list","children":[{"role":"listitem","name":"Home"}]}"#,
        );
        let node = load_tree(file.path()).unwrap();
        assert_eq!(node.role, "list");
        assert_eq!(node.children[0].name.as_deref(), Some("Home"));
    }

    #[test]
    fn test_load_tree_from_snapshot_text() {
        let file = write_temp(".yaml", "- list:\n  - listitem: Home\n");
        let node = load_tree(file.path()).unwrap();
        assert_eq!(node.role, "list");
        assert_eq!(node.children.len(), 1);
    }

    #[tokio::test]
    async fn test_compare_reports_mismatch() {
        let actual = write_temp(".yaml", "- list:\n  - listitem: Home\n");
        let expected = write_temp(".yaml", "- list:\n  - listitem: home\n");
        let ok = dispatch(
            Commands::Compare {
                actual: actual.path().to_path_buf(),
                expected: expected.path().to_path_buf(),
                json: true,
            },
            Config::default(),
        )
        .await
        .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = dispatch(
            Commands::Render {
                tree: "/nonexistent/tree.json".into(),
                refs: false,
            },
            Config::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
