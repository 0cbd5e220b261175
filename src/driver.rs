//! Experiment Driver - walks the (matrix × threads) grid
//!
//! The driver checks that every configured matrix file exists, then runs one
//! trial per cell in configured order. Trial failures, including a run that
//! printed none of the expected metrics, are printed and skipped. Only the
//! up-front checks or a harness-level error can abort a run.

use std::io::Write;
use std::path::Path;

use crate::config::BenchConfig;
use crate::experiment::{
    DeterminantCheck, MatrixSeries, ResultsGrid, TrialRecord, TrialStatus, TrialSummary,
};
use crate::parser::{OutputParser, TrialResult};
use crate::runner::TrialRunner;
use crate::{Error, Result};

/// Everything a completed run produced.
#[derive(Debug, Clone, Default)]
pub struct ExperimentOutcome {
    /// Aggregated series per matrix, in configured order
    pub grid: ResultsGrid,
    /// One record per attempted cell, in run order
    pub trials: Vec<TrialRecord>,
}

impl ExperimentOutcome {
    /// Tally trial outcomes.
    #[must_use]
    pub fn summary(&self) -> TrialSummary {
        TrialSummary::from_trials(&self.trials)
    }
}

/// Sequential benchmark driver.
pub struct ExperimentDriver<'a, R, P> {
    config: &'a BenchConfig,
    runner: R,
    parser: P,
    quiet: bool,
}

impl<'a, R: TrialRunner, P: OutputParser> ExperimentDriver<'a, R, P> {
    /// Create a driver over `config` using the given runner and parser.
    #[must_use]
    pub fn new(config: &'a BenchConfig, runner: R, parser: P) -> Self {
        Self {
            config,
            runner,
            parser,
            quiet: false,
        }
    }

    /// Suppress console progress lines.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run every trial and collect the results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] or [`Error::MissingInput`] before
    /// any trial is started. Once trials run, only errors for which
    /// [`Error::is_trial_failure`] is false are returned.
    pub fn run(&self) -> Result<ExperimentOutcome> {
        self.config.validate()?;
        self.config.verify_inputs()?;

        let mut outcome = ExperimentOutcome::default();
        for matrix in &self.config.matrices {
            self.say(&format!(
                "\nMatrix {} (file: {}):",
                matrix.name,
                matrix.path.display()
            ));
            let _span = tracing::info_span!("matrix", name = %matrix.name).entered();

            let mut series = MatrixSeries::new();
            for &threads in &self.config.thread_counts {
                let trial = self.run_trial(&matrix.name, &matrix.path, threads, &mut series)?;
                outcome.trials.push(trial);
            }
            tracing::info!(recorded = series.len(), "matrix complete");
            outcome.grid.insert(matrix.name.clone(), series);
        }
        Ok(outcome)
    }

    fn run_trial(
        &self,
        name: &str,
        path: &Path,
        threads: u32,
        series: &mut MatrixSeries,
    ) -> Result<TrialRecord> {
        let mut trial = TrialRecord::new(name, threads);
        self.say_inline(&format!("  Threads: {threads:2}... "));
        trial.start();

        let output = match self.runner.run(path, threads) {
            Ok(output) => output,
            Err(err) if err.is_trial_failure() => {
                self.say("❌");
                self.say(&format!("    error: {err}"));
                tracing::warn!(matrix = name, threads, error = %err, "trial failed");
                let status = if matches!(err, Error::Timeout { .. }) {
                    TrialStatus::TimedOut
                } else {
                    TrialStatus::Failed
                };
                trial.fail(status, err.to_string());
                return Ok(trial);
            }
            Err(err) => return Err(err),
        };

        let result = self.parser.parse(&output);
        if result.is_empty() {
            self.say("❌");
            tracing::warn!(matrix = name, threads, "no metrics in solver output");
            trial.fail(TrialStatus::Failed, "no metrics in output");
            return Ok(trial);
        }
        if let DeterminantCheck::Mismatch { latched, observed } = series.record(threads, &result) {
            tracing::warn!(
                matrix = name,
                threads,
                latched,
                observed,
                "determinant differs from the first recorded value"
            );
            trial.mark_determinant_mismatch();
        }
        trial.succeed();
        self.report(&result);
        Ok(trial)
    }

    fn report(&self, result: &TrialResult) {
        let seq = result.sequential_time_or_zero();
        let par = result.parallel_time_or_zero();
        self.say(&format!(
            "Speedup: {:5.2}x, Efficiency: {:5.1}%",
            result.speedup_or_zero(),
            result.efficiency_or_zero()
        ));
        self.say(&format!(
            "    Sequential: {seq:5.3} s ({:5.0} ms), Parallel: {par:5.3} s ({:5.0} ms)",
            seq * 1000.0,
            par * 1000.0
        ));
    }

    fn say(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn say_inline(&self, text: &str) {
        if !self.quiet {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::MatrixSpec;
    use crate::parser::LocalizedTextParser;

    fn config_with(paths: Vec<MatrixSpec>, threads: &[u32]) -> BenchConfig {
        BenchConfig::builder()
            .matrices(paths)
            .thread_counts(threads.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_input_aborts_before_any_trial() {
        let config = config_with(
            vec![MatrixSpec::new("ghost", "/nonexistent/det-bench/ghost.txt")],
            &[1, 2],
        );
        let calls = Cell::new(0);
        let runner = |_: &Path, _: u32| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok(String::new())
        };
        let driver = ExperimentDriver::new(&config, runner, LocalizedTextParser::russian().unwrap())
            .quiet(true);

        assert!(matches!(driver.run(), Err(Error::MissingInput { .. })));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_failed_trial_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = dir.path().join("m.txt");
        std::fs::write(&matrix, "2\n1 0\n0 1\n").unwrap();
        let config = config_with(vec![MatrixSpec::new("m", &matrix)], &[1, 2, 3]);

        let runner = |_: &Path, threads: u32| -> Result<String> {
            match threads {
                2 => Err(Error::Timeout {
                    timeout: std::time::Duration::from_secs(120),
                }),
                _ => Ok(format!("Детерминант: 1.0\nУскорение: {threads}.0x\n")),
            }
        };
        let driver = ExperimentDriver::new(&config, runner, LocalizedTextParser::russian().unwrap())
            .quiet(true);
        let outcome = driver.run().unwrap();

        let series = outcome.grid.get("m").unwrap();
        assert_eq!(series.threads(), &[1, 3]);
        assert_eq!(series.speedup(), &[1.0, 3.0]);
        assert_eq!(series.efficiency(), &[0.0, 0.0]);
        assert_eq!(outcome.trials.len(), 3);
        assert_eq!(outcome.trials[1].status(), TrialStatus::TimedOut);
        assert_eq!(outcome.summary().succeeded, 2);
    }

    fn one_matrix(dir: &Path, threads: &[u32]) -> BenchConfig {
        let matrix = dir.join("m.txt");
        std::fs::write(&matrix, "1\n5\n").unwrap();
        config_with(vec![MatrixSpec::new("m", &matrix)], threads)
    }

    #[test]
    fn test_output_without_metrics_is_a_failed_trial() {
        let dir = tempfile::tempdir().unwrap();
        let config = one_matrix(dir.path(), &[1, 2]);

        let runner = |_: &Path, threads: u32| -> Result<String> {
            match threads {
                1 => Ok("Ошибка: некорректная матрица\n".to_string()),
                _ => Ok("Ускорение: 2.0x\n".to_string()),
            }
        };
        let outcome = ExperimentDriver::new(&config, runner, LocalizedTextParser::russian().unwrap())
            .quiet(true)
            .run()
            .unwrap();

        let series = outcome.grid.get("m").unwrap();
        assert_eq!(series.threads(), &[2]);
        assert_eq!(series.speedup(), &[2.0]);
        assert_eq!(outcome.trials[0].status(), TrialStatus::Failed);
        assert_eq!(outcome.trials[0].failure(), Some("no metrics in output"));
        assert_eq!(outcome.summary().failed, 1);
    }

    #[test]
    fn test_harness_error_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = one_matrix(dir.path(), &[1, 2, 3]);

        let calls = Cell::new(0);
        let runner = |_: &Path, _: u32| -> Result<String> {
            calls.set(calls.get() + 1);
            Err(Error::Io(std::io::Error::other("wait failed")))
        };
        let result = ExperimentDriver::new(&config, runner, LocalizedTextParser::russian().unwrap())
            .quiet(true)
            .run();

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_any_trial() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = one_matrix(dir.path(), &[1]);
        config.matrices.push(config.matrices[0].clone());

        let calls = Cell::new(0);
        let runner = |_: &Path, _: u32| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok("Ускорение: 1.0x\n".to_string())
        };
        let result = ExperimentDriver::new(&config, runner, LocalizedTextParser::russian().unwrap())
            .quiet(true)
            .run();

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert_eq!(calls.get(), 0);
    }
}
