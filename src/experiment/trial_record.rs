//! Trial Record - one invocation of the solver for a (matrix, threads) cell

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    /// Trial is scheduled but not yet started.
    Pending,
    /// Solver process is running.
    Running,
    /// Solver exited with code 0; its output was parsed.
    Success,
    /// Solver could not be spawned or exited non-zero.
    Failed,
    /// Solver exceeded the timeout and was killed.
    TimedOut,
}

/// Trial Record tracks the lifecycle of a single solver invocation.
///
/// Records are kept for every cell of the grid, including failed ones, so the
/// end-of-run summary can report what was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialRecord {
    matrix: String,
    threads: u32,
    status: TrialStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    failure: Option<String>,
    determinant_mismatch: bool,
}

impl TrialRecord {
    /// Create a new trial record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Display name of the matrix
    /// * `threads` - Thread count passed to the solver
    #[must_use]
    pub fn new(matrix: impl Into<String>, threads: u32) -> Self {
        Self {
            matrix: matrix.into(),
            threads,
            status: TrialStatus::Pending,
            started_at: None,
            ended_at: None,
            failure: None,
            determinant_mismatch: false,
        }
    }

    /// Get the matrix display name.
    #[must_use]
    pub fn matrix(&self) -> &str {
        &self.matrix
    }

    /// Get the thread count.
    #[must_use]
    pub const fn threads(&self) -> u32 {
        self.threads
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> TrialStatus {
        self.status
    }

    /// Get the start timestamp, if the trial has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the trial has finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Failure description for failed or timed-out trials.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Whether this trial reported a determinant different from the one
    /// latched for its matrix.
    #[must_use]
    pub const fn determinant_mismatch(&self) -> bool {
        self.determinant_mismatch
    }

    /// Start the trial, transitioning from Pending to Running.
    pub fn start(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Complete the trial successfully.
    pub fn succeed(&mut self) {
        self.status = TrialStatus::Success;
        self.ended_at = Some(Utc::now());
    }

    /// Complete the trial with a failure status and a reason.
    ///
    /// # Arguments
    ///
    /// * `status` - `Failed` or `TimedOut`
    /// * `reason` - Human-readable failure description
    pub fn fail(&mut self, status: TrialStatus, reason: impl Into<String>) {
        self.status = status;
        self.failure = Some(reason.into());
        self.ended_at = Some(Utc::now());
    }

    /// Flag a determinant that disagrees with the matrix's latched value.
    pub fn mark_determinant_mismatch(&mut self) {
        self.determinant_mismatch = true;
    }
}

/// Counts of trial outcomes for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Trials whose output was recorded
    pub succeeded: usize,
    /// Trials that failed to spawn or exited non-zero
    pub failed: usize,
    /// Trials killed by the timeout
    pub timed_out: usize,
    /// Successful trials whose determinant disagreed with the latched one
    pub determinant_mismatches: usize,
}

impl TrialSummary {
    /// Tally a slice of trial records.
    #[must_use]
    pub fn from_trials(trials: &[TrialRecord]) -> Self {
        trials.iter().fold(Self::default(), |mut acc, trial| {
            match trial.status() {
                TrialStatus::Success => acc.succeeded += 1,
                TrialStatus::Failed => acc.failed += 1,
                TrialStatus::TimedOut => acc.timed_out += 1,
                TrialStatus::Pending | TrialStatus::Running => {}
            }
            if trial.determinant_mismatch() {
                acc.determinant_mismatches += 1;
            }
            acc
        })
    }

    /// Total trials that finished, successfully or not.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out
    }
}
