//! # det-bench: Thread-Scaling Harness for an External Determinant Solver
//!
//! det-bench runs a determinant solver once per (matrix, thread count) cell,
//! scrapes its report for timing and scaling metrics, and produces a JSON
//! results dump plus a speedup/efficiency chart.
//!
//! ## Pipeline
//!
//! ```text
//! ExperimentDriver ──> TrialRunner ──> OutputParser   (per cell)
//!        │
//!        └──> ResultsGrid ──┬──> persist::save_results
//!                           └──> ChartRenderer
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use det_bench::config::BenchConfig;
//! use det_bench::driver::ExperimentDriver;
//! use det_bench::parser::LocalizedTextParser;
//! use det_bench::runner::ProcessRunner;
//!
//! let config = BenchConfig::default();
//! let parser = LocalizedTextParser::new(&config.labels)?;
//! let runner = ProcessRunner::from_config(&config);
//! let outcome = ExperimentDriver::new(&config, runner, parser).run()?;
//!
//! det_bench::persist::save_results(&outcome.grid, &config.results_path)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod chart;
pub mod config;
pub mod driver;
pub mod error;
pub mod experiment;
pub mod parser;
pub mod persist;
pub mod runner;

pub use error::{Error, Result};
