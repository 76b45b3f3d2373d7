//! Run configuration.
//!
//! Precedence: CLI flags override the JSON config file, which overrides the
//! defaults below.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::providers::standard_providers;
use crate::collector::{CollectorSettings, ConfigurationError, Registry};
use crate::model::Category;
use crate::report::{ArtifactNames, DEFAULT_REPORT_FILE, DEFAULT_SNAPSHOT_FILE};

/// Configuration file contents, also the resolved configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default per-provider timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    /// Registers providers that need `sudo`.
    #[serde(default)]
    pub allow_elevated: bool,
    /// Provider name to priority, replacing the built-in priority.
    #[serde(default)]
    pub priorities: BTreeMap<String, u32>,
    /// Provider names that are not registered at all.
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub provider_timeouts_ms: BTreeMap<String, u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            output_dir: default_output_dir(),
            snapshot_file: default_snapshot_file(),
            report_file: default_report_file(),
            allow_elevated: false,
            priorities: BTreeMap::new(),
            disabled: Vec::new(),
            provider_timeouts_ms: BTreeMap::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    CollectorSettings::DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_max_concurrency() -> usize {
    CollectorSettings::DEFAULT_MAX_CONCURRENCY
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

fn default_report_file() -> String {
    DEFAULT_REPORT_FILE.to_string()
}

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub timeout_ms: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub output_dir: Option<PathBuf>,
    /// A flag can only turn elevation on.
    pub allow_elevated: bool,
}

impl Config {
    /// Loads a config file. Missing keys take their defaults; unknown keys
    /// are rejected.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ConfigurationError::ConfigFile { message, .. } => ConfigurationError::ConfigFile {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ConfigurationError::ConfigFile {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies CLI overrides on top of this configuration.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigurationError> {
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(max_concurrency) = overrides.max_concurrency {
            self.max_concurrency = max_concurrency;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        self.allow_elevated |= overrides.allow_elevated;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.timeout_ms == 0 {
            return Err(ConfigurationError::Invalid(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigurationError::Invalid(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        if let Some((name, _)) = self.provider_timeouts_ms.iter().find(|(_, ms)| **ms == 0) {
            return Err(ConfigurationError::Invalid(format!(
                "timeout for provider '{name}' must be greater than zero"
            )));
        }
        for name in [&self.snapshot_file, &self.report_file] {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigurationError::Invalid(format!(
                    "artifact name '{name}' must be a plain file name"
                )));
            }
        }
        if self.snapshot_file == self.report_file {
            return Err(ConfigurationError::Invalid(
                "snapshot_file and report_file must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            max_concurrency: self.max_concurrency,
        }
    }

    pub fn artifact_names(&self) -> ArtifactNames {
        ArtifactNames {
            snapshot: self.snapshot_file.clone(),
            report: self.report_file.clone(),
        }
    }

    /// Builds the registry of standard providers for `categories`, with this
    /// configuration's priority, timeout and disable overrides applied.
    ///
    /// Overrides naming an elevated provider while elevation is off are
    /// rejected like any other unknown provider.
    pub fn build_registry(&self, categories: &[Category]) -> Result<Registry, ConfigurationError> {
        let mut builder = Registry::builder()
            .register_all(standard_providers(self.allow_elevated))
            .categories(categories.iter().copied());
        for (name, priority) in &self.priorities {
            builder = builder.priority(name.clone(), *priority);
        }
        for (name, ms) in &self.provider_timeouts_ms {
            builder = builder.timeout(name.clone(), Duration::from_millis(*ms));
        }
        for name in &self.disabled {
            builder = builder.disable(name.clone());
        }
        builder.build()
    }
}
