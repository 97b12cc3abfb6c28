//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Scenario execution settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scenario execution settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunnerConfig {
    /// Timeout applied to steps that do not declare their own
    #[serde(default)]
    pub default_step_timeout_ms: Option<u64>,

    /// How many times a failed scenario is re-run inside a suite
    #[serde(default)]
    pub retries: u32,

    /// Treat scenarios that only passed on retry as failures
    #[serde(default)]
    pub fail_on_flaky: bool,
}

impl RunnerConfig {
    pub fn default_step_timeout(&self) -> Option<Duration> {
        self.default_step_timeout_ms.map(Duration::from_millis)
    }
}

/// Report format for finished scenarios
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Colored, human-readable step list
    #[default]
    Pretty,
    /// Scenario logs as JSON
    Json,
}

/// Report settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Print attachments and skip reasons for every step
    #[serde(default)]
    pub verbose: bool,
}

/// Log settings
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Also write logs to the data directory
    #[serde(default)]
    pub file: bool,

    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "stepwright=info,warn".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.runner.retries, 0);
        assert!(!config.runner.fail_on_flaky);
        assert!(config.runner.default_step_timeout().is_none());
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert_eq!(config.logging.filter, "stepwright=info,warn");
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
[runner]
default_step_timeout_ms = 1500
retries = 2
fail_on_flaky = true

[output]
format = "json"
verbose = true

[logging]
file = true
filter = "stepwright=debug"
"#,
        )
        .unwrap();

        assert_eq!(
            config.runner.default_step_timeout(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(config.runner.retries, 2);
        assert!(config.runner.fail_on_flaky);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.verbose);
        assert!(config.logging.file);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runner]\nretries = 1\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.runner.retries, 1);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = Config::from_toml("[runner]\nretries = \"many\"\n").unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }
}
