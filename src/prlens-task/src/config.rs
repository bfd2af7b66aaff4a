//! Review configuration.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use prlens_batch::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_STEPS};
use serde::{Deserialize, Serialize};

use crate::{Result, TaskError};

/// Tunables for a review task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Files per batch; one comment is posted per batch.
    pub batch_size: usize,

    /// Transition ceiling for a single batch run.
    pub max_steps: usize,

    /// Bound on one model call in seconds. 0 disables the bound.
    pub analysis_timeout_secs: u64,

    /// Leave out files deleted by the pull request.
    pub skip_removed_files: bool,

    /// Prefix comments with "Batch N of M" when a review spans several batches.
    pub label_batches: bool,
}

fn default_analysis_timeout() -> u64 {
    120 // 2 minutes per file
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_steps: DEFAULT_MAX_STEPS,
            analysis_timeout_secs: default_analysis_timeout(),
            skip_removed_files: true,
            label_batches: true,
        }
    }
}

impl ReviewConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `PRLENS_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PRLENS_BATCH_SIZE") {
            self.batch_size = parse_var("PRLENS_BATCH_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("PRLENS_MAX_STEPS") {
            self.max_steps = parse_var("PRLENS_MAX_STEPS", &raw)?;
        }
        if let Some(raw) = lookup("PRLENS_ANALYSIS_TIMEOUT_SECS") {
            self.analysis_timeout_secs = parse_var("PRLENS_ANALYSIS_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PRLENS_SKIP_REMOVED_FILES") {
            self.skip_removed_files = parse_flag("PRLENS_SKIP_REMOVED_FILES", &raw)?;
        }
        if let Some(raw) = lookup("PRLENS_LABEL_BATCHES") {
            self.label_batches = parse_flag("PRLENS_LABEL_BATCHES", &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(TaskError::Config("batch_size must be at least 1".to_string()));
        }
        // Each file costs three transitions; a full batch must fit.
        let needed = self.batch_size.saturating_mul(3);
        if self.max_steps < needed {
            return Err(TaskError::Config(format!(
                "max_steps ({}) is below the {} transitions a batch of {} needs",
                self.max_steps, needed, self.batch_size
            )));
        }
        Ok(())
    }

    /// Per-call timeout, if one is configured.
    pub fn analysis_timeout(&self) -> Option<Duration> {
        (self.analysis_timeout_secs > 0).then(|| Duration::from_secs(self.analysis_timeout_secs))
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| TaskError::Config(format!("{name}: invalid value '{raw}'")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TaskError::Config(format!("{name}: invalid value '{raw}'"))),
    }
}
