//! Process runner and binary tests against shell-script solvers
//!
//! Each test writes a small `/bin/sh` script that stands in for the
//! determinant solver. Tests in this file hold a shared lock while they write
//! and execute scripts: a script still open for writing in one thread while
//! another thread forks fails to exec with ETXTBSY.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use det_bench::config::{BenchConfig, MatrixSpec};
use det_bench::driver::ExperimentDriver;
use det_bench::parser::LocalizedTextParser;
use det_bench::persist::load_results;
use det_bench::runner::{ProcessRunner, TrialRunner};
use det_bench::Error;

static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Solver that reports a speedup of `<threads>.5x` and echoes its arguments.
const ECHO_SOLVER: &str = r#"echo "args: $*"
echo "Детерминант: -inf"
echo "Время последовательно: 1.000000000 сек (1000.000 мс)"
echo "Время параллельно: 0.500000000 сек (500.000 мс)"
echo "Ускорение: ${4}.5x"
echo "Эффективность: 50.00% (0.5000)""#;

#[test]
fn test_successful_run_returns_stdout() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let solver = script(dir.path(), "solver.sh", ECHO_SOLVER);

    let runner = ProcessRunner::new(&solver, Duration::from_secs(10));
    let output = runner.run(Path::new("matrix.txt"), 3).unwrap();

    assert!(output.contains("args: -f matrix.txt -t 3"));
    assert!(output.contains("Ускорение: 3.5x"));
}

#[test]
fn test_non_zero_exit_carries_stderr() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let solver = script(
        dir.path(),
        "failing.sh",
        "echo 'partial output'\necho 'Не удалось загрузить матрицу из файла' >&2\nexit 3",
    );

    let runner = ProcessRunner::new(&solver, Duration::from_secs(10));
    match runner.run(Path::new("matrix.txt"), 1) {
        Err(Error::NonZeroExit { code, stderr }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "Не удалось загрузить матрицу из файла");
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[test]
fn test_hung_solver_is_killed_at_timeout() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let solver = script(dir.path(), "hang.sh", "exec sleep 30");

    let runner = ProcessRunner::new(&solver, Duration::from_millis(300))
        .poll_interval(Duration::from_millis(10));
    let start = Instant::now();
    let err = runner.run(Path::new("matrix.txt"), 1).unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
    assert!(err.is_trial_failure());
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_large_output_does_not_deadlock() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    // Well past a 64 KiB pipe buffer on both streams.
    let solver = script(
        dir.path(),
        "chatty.sh",
        "i=0\nwhile [ $i -lt 4000 ]; do\n  echo 'padding line for the pipe buffer ..........'\n  echo 'stderr padding ..............................' >&2\n  i=$((i+1))\ndone\necho 'Ускорение: 2.0x'",
    );

    let runner = ProcessRunner::new(&solver, Duration::from_secs(30));
    let output = runner.run(Path::new("matrix.txt"), 2).unwrap();
    assert!(output.ends_with("Ускорение: 2.0x\n"));
}

#[test]
fn test_driver_with_real_processes() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let solver = script(dir.path(), "solver.sh", ECHO_SOLVER);
    let matrix = dir.path().join("m.txt");
    fs::write(&matrix, "1\n5\n").unwrap();

    let config = BenchConfig::builder()
        .executable(&solver)
        .matrices(vec![MatrixSpec::new("m", &matrix)])
        .thread_counts([1, 2])
        .timeout_secs(10)
        .build()
        .unwrap();
    let outcome = ExperimentDriver::new(
        &config,
        ProcessRunner::from_config(&config),
        LocalizedTextParser::new(&config.labels).unwrap(),
    )
    .quiet(true)
    .run()
    .unwrap();

    let series = outcome.grid.get("m").unwrap();
    assert_eq!(series.threads(), &[1, 2]);
    assert_eq!(series.speedup(), &[1.5, 2.5]);
    assert_eq!(series.efficiency(), &[50.0, 50.0]);
    assert_eq!(series.parallel_times(), &[0.5, 0.5]);
    assert_eq!(series.determinant(), Some(f64::NEG_INFINITY));
}

#[test]
fn test_binary_exits_one_on_missing_matrix() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");

    let output = Command::new(env!("CARGO_BIN_EXE_det-bench"))
        .arg("--matrix")
        .arg(format!("ghost={}", dir.path().join("ghost.txt").display()))
        .arg("--results")
        .arg(&results)
        .arg("--no-chart")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost.txt"));
    assert!(!results.exists());
}

#[test]
fn test_binary_writes_results() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let solver = script(dir.path(), "solver.sh", ECHO_SOLVER);
    let matrix = dir.path().join("m.txt");
    fs::write(&matrix, "1\n5\n").unwrap();
    let results = dir.path().join("results.json");

    let output = Command::new(env!("CARGO_BIN_EXE_det-bench"))
        .arg("--executable")
        .arg(&solver)
        .arg("--matrix")
        .arg(format!("m={}", matrix.display()))
        .args(["--threads", "1,2,3"])
        .arg("--results")
        .arg(&results)
        .args(["--no-chart", "--no-show"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let grid = load_results(&results).unwrap();
    let series = grid.get("m").unwrap();
    assert_eq!(series.threads(), &[1, 2, 3]);
    assert_eq!(series.speedup(), &[1.5, 2.5, 3.5]);

    let raw = fs::read_to_string(&results).unwrap();
    assert!(raw.contains("\"determinant\": \"-inf\""));
}
