//! Trial Runner - one solver invocation per (matrix, threads) cell
//!
//! The solver is started as `<executable> -f <matrix> -t <threads>`. Its
//! stdout and stderr are drained on helper threads while the runner polls for
//! exit, so a chatty child cannot stall on a full pipe. A child still running
//! when the timeout expires is killed and reaped.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::BenchConfig;
use crate::{Error, Result};

/// Default interval between exit polls.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Executes one trial and returns the solver's standard output.
///
/// Failures are returned as errors for which
/// [`Error::is_trial_failure`] holds; the driver contains them per trial.
pub trait TrialRunner {
    /// Run the solver on `matrix` with `threads` threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`], [`Error::Timeout`] or [`Error::NonZeroExit`]
    /// for a failed trial. Any other error means the harness itself is in
    /// trouble and aborts the run.
    fn run(&self, matrix: &Path, threads: u32) -> Result<String>;
}

impl<F> TrialRunner for F
where
    F: Fn(&Path, u32) -> Result<String>,
{
    fn run(&self, matrix: &Path, threads: u32) -> Result<String> {
        self(matrix, threads)
    }
}

/// Runs the external solver as a child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
    timeout: Duration,
    poll_interval: Duration,
}

impl ProcessRunner {
    /// Create a runner for `executable` with the given per-trial timeout.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Create a runner from the harness configuration.
    #[must_use]
    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(config.executable.clone(), config.timeout())
    }

    /// Override the exit polling interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get the executable path.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Get the per-trial timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `child` until it exits or the timeout passes.
    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(err) => {
                    reap(child);
                    return Err(err.into());
                }
            }
            if start.elapsed() >= self.timeout {
                reap(child);
                return Err(Error::Timeout {
                    timeout: self.timeout,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl TrialRunner for ProcessRunner {
    fn run(&self, matrix: &Path, threads: u32) -> Result<String> {
        let mut command = Command::new(&self.executable);
        command
            .arg("-f")
            .arg(matrix)
            .arg("-t")
            .arg(threads.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(?command, "spawning solver");

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: self.executable.clone(),
            source,
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the drain threads are left to finish on their own: a
        // grandchild may still hold the pipes open.
        let status = self.wait_with_timeout(&mut child)?;

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if status.success() {
            Ok(stdout)
        } else {
            Err(Error::NonZeroExit {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Kill and reap so no solver outlives its trial.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let runner = ProcessRunner::new("/nonexistent/det-bench/solver", Duration::from_secs(1));
        let err = runner.run(Path::new("m.txt"), 2).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(err.is_trial_failure());
    }

    #[test]
    fn test_from_config_uses_timeout() {
        let config = BenchConfig::builder().timeout_secs(7).build().unwrap();
        let runner = ProcessRunner::from_config(&config);
        assert_eq!(runner.timeout(), Duration::from_secs(7));
        assert_eq!(runner.executable(), Path::new("./determinant"));
    }

    #[test]
    fn test_closure_runner() {
        let runner = |_: &Path, threads: u32| -> Result<String> { Ok(format!("Ускорение: {threads}.0x")) };
        assert_eq!(runner.run(Path::new("m.txt"), 3).unwrap(), "Ускорение: 3.0x");
    }
}
