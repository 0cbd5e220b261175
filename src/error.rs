//! Error types for det-bench
//!
//! Only configuration errors abort a run. Trial-level variants are produced by
//! the runner and recovered by the driver, one trial at a time.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// det-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// A configured matrix file does not exist
    #[error("Matrix file {} not found (matrix '{name}')\nNo trials were run.", .path.display())]
    MissingInput {
        /// Display name of the matrix
        name: String,
        /// Configured path
        path: PathBuf,
    },

    /// The benchmark configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external program could not be started
    #[error("Failed to spawn {}: {source}", .program.display())]
    Spawn {
        /// Executable that was invoked
        program: PathBuf,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// The external program ran past the per-trial timeout and was killed
    #[error("Process killed after {timeout:?} timeout")]
    Timeout {
        /// Timeout that was exceeded
        timeout: Duration,
    },

    /// The external program exited unsuccessfully
    #[error("Process exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    NonZeroExit {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error text
        stderr: String,
    },

    /// An output pattern failed to compile
    #[error("Output pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Chart rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is a per-trial failure the driver recovers from.
    #[must_use]
    pub const fn is_trial_failure(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::Timeout { .. } | Self::NonZeroExit { .. }
        )
    }
}
