//! Experiment data model
//!
//! ## Schema Overview
//!
//! ```text
//! ResultsGrid (1) ──< MatrixSeries (N)  [one per configured matrix]
//!                          │
//!                          └── aligned sequences, one entry per successful trial
//!
//! TrialRecord (N)  [one per (matrix, threads) cell, successful or not]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use det_bench::experiment::{MatrixSeries, ResultsGrid, TrialRecord, TrialStatus};
//! use det_bench::parser::TrialResult;
//!
//! let mut trial = TrialRecord::new("2000x2000", 4);
//! trial.start();
//!
//! let mut series = MatrixSeries::new();
//! series.record(4, &TrialResult { speedup: Some(3.2), ..TrialResult::default() });
//! trial.succeed();
//!
//! let mut grid = ResultsGrid::new();
//! grid.insert("2000x2000", series);
//! assert_eq!(grid.max_threads(), Some(4));
//! assert_eq!(trial.status(), TrialStatus::Success);
//! ```

mod grid;
mod matrix_series;
mod trial_record;

pub use grid::ResultsGrid;
pub use matrix_series::{DeterminantCheck, MatrixSeries};
pub use trial_record::{TrialRecord, TrialStatus, TrialSummary};
