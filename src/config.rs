//! Benchmark configuration
//!
//! [`BenchConfig::default`] is the reference setup: three fixed matrices under
//! `./files/`, thread counts 1 through 10 and a 120 second timeout per trial.
//! A JSON file can override any subset of fields; the CLI layers on top.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parser::OutputLabels;
use crate::{Error, Result};

/// Default solver executable.
pub const DEFAULT_EXECUTABLE: &str = "./determinant";

/// Default per-trial timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default results dump path.
pub const DEFAULT_RESULTS_PATH: &str = "fixed_matrix_results.json";

/// Default chart image path.
pub const DEFAULT_CHART_PATH: &str = "fixed_matrices_performance.png";

/// One input matrix: a display name and the file handed to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSpec {
    /// Display name used as the results key and chart label
    pub name: String,
    /// Path passed to the solver via `-f`
    pub path: PathBuf,
}

impl MatrixSpec {
    /// Create a matrix spec.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Full harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Solver executable
    pub executable: PathBuf,
    /// Matrices in run order
    pub matrices: Vec<MatrixSpec>,
    /// Thread counts in run order
    pub thread_counts: Vec<u32>,
    /// Wall-clock limit per trial
    pub timeout_secs: u64,
    /// Where the JSON results are written
    pub results_path: PathBuf,
    /// Where the chart PNG is written
    pub chart_path: PathBuf,
    /// Labels the solver prints
    pub labels: OutputLabels,
    /// Try to open the chart in a viewer after saving it
    pub show_chart: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            matrices: vec![
                MatrixSpec::new("2000x2000", "./files/sample_2000x2000.txt"),
                MatrixSpec::new("3000x3000", "./files/sample_3000x3000.txt"),
                MatrixSpec::new("4000x4000", "./files/sample_4000x4000.txt"),
            ],
            thread_counts: (1..=10).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            labels: OutputLabels::default(),
            show_chart: true,
        }
    }
}

impl BenchConfig {
    /// Create a builder starting from the reference configuration.
    #[must_use]
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, a JSON error if it is
    /// malformed, or [`Error::InvalidConfig`] if it fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Per-trial timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an empty matrix or thread list, a
    /// zero thread count, a zero timeout, or duplicate matrix names.
    pub fn validate(&self) -> Result<()> {
        if self.matrices.is_empty() {
            return Err(Error::InvalidConfig("no matrices configured".to_string()));
        }
        if self.thread_counts.is_empty() {
            return Err(Error::InvalidConfig(
                "no thread counts configured".to_string(),
            ));
        }
        if self.thread_counts.contains(&0) {
            return Err(Error::InvalidConfig(
                "thread counts must be positive".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for matrix in &self.matrices {
            if !seen.insert(matrix.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate matrix name '{}'",
                    matrix.name
                )));
            }
        }
        Ok(())
    }

    /// Fail fast if any configured matrix file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for the first missing file.
    pub fn verify_inputs(&self) -> Result<()> {
        for matrix in &self.matrices {
            if !matrix.path.exists() {
                return Err(Error::MissingInput {
                    name: matrix.name.clone(),
                    path: matrix.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for `BenchConfig`.
#[derive(Debug, Default)]
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    /// Set the solver executable.
    #[must_use]
    pub fn executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.config.executable = executable.into();
        self
    }

    /// Replace the matrix list.
    #[must_use]
    pub fn matrices(mut self, matrices: Vec<MatrixSpec>) -> Self {
        self.config.matrices = matrices;
        self
    }

    /// Replace the thread counts.
    #[must_use]
    pub fn thread_counts(mut self, thread_counts: impl IntoIterator<Item = u32>) -> Self {
        self.config.thread_counts = thread_counts.into_iter().collect();
        self
    }

    /// Set the per-trial timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Set the results dump path.
    #[must_use]
    pub fn results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.results_path = path.into();
        self
    }

    /// Set the chart image path.
    #[must_use]
    pub fn chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chart_path = path.into();
        self
    }

    /// Set the output labels.
    #[must_use]
    pub fn labels(mut self, labels: OutputLabels) -> Self {
        self.config.labels = labels;
        self
    }

    /// Enable or disable the interactive chart viewer.
    #[must_use]
    pub const fn show_chart(mut self, show: bool) -> Self {
        self.config.show_chart = show;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if validation fails.
    pub fn build(self) -> Result<BenchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
