//! det-bench - thread-scaling benchmark for the determinant solver
//!
//! Usage:
//!   det-bench                                   # reference setup (./determinant, ./files/*)
//!   det-bench --config bench.json               # load a JSON config
//!   det-bench --threads 1,2,4,8 --no-show       # override thread counts, skip viewer
//!   det-bench --matrix big=./files/m.txt -v     # custom matrix, info logging

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use det_bench::chart::{present_chart, BitmapRenderer, ChartRenderer, SystemViewer};
use det_bench::config::{BenchConfig, MatrixSpec};
use det_bench::driver::{ExperimentDriver, ExperimentOutcome};
use det_bench::parser::{LocalizedTextParser, OutputLabels};
use det_bench::persist;
use det_bench::runner::ProcessRunner;

/// det-bench - run the determinant solver across matrices and thread counts
#[derive(Parser)]
#[command(name = "det-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (missing fields take reference defaults)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Solver executable
    #[arg(long, value_name = "PATH")]
    executable: Option<PathBuf>,

    /// Matrix to benchmark as NAME=PATH (repeatable; replaces configured matrices)
    #[arg(short, long = "matrix", value_name = "NAME=PATH", value_parser = parse_matrix)]
    matrices: Vec<MatrixSpec>,

    /// Comma-separated thread counts
    #[arg(short, long, value_delimiter = ',', value_name = "N,N,...")]
    threads: Option<Vec<u32>>,

    /// Per-trial timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Results JSON path
    #[arg(long, value_name = "PATH")]
    results: Option<PathBuf>,

    /// Chart PNG path
    #[arg(long, value_name = "PATH")]
    chart: Option<PathBuf>,

    /// Label language of the solver's output
    #[arg(long, value_enum)]
    labels: Option<LabelSet>,

    /// Do not try to open the chart in a viewer
    #[arg(long)]
    no_show: bool,

    /// Skip chart rendering entirely
    #[arg(long)]
    no_chart: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LabelSet {
    Russian,
    English,
}

fn parse_matrix(arg: &str) -> Result<MatrixSpec, String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok(MatrixSpec::new(name, path))
        }
        _ => Err(format!("expected NAME=PATH, got '{arg}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("DET_BENCH_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> anyhow::Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BenchConfig::default(),
    };

    if let Some(executable) = &cli.executable {
        config.executable.clone_from(executable);
    }
    if !cli.matrices.is_empty() {
        config.matrices.clone_from(&cli.matrices);
    }
    if let Some(threads) = &cli.threads {
        config.thread_counts.clone_from(threads);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(results) = &cli.results {
        config.results_path.clone_from(results);
    }
    if let Some(chart) = &cli.chart {
        config.chart_path.clone_from(chart);
    }
    match cli.labels {
        Some(LabelSet::Russian) => config.labels = OutputLabels::russian(),
        Some(LabelSet::English) => config.labels = OutputLabels::english(),
        None => {}
    }
    if cli.no_show {
        config.show_chart = false;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    println!("🔬 Benchmarking fixed matrices");
    println!("{}", "=".repeat(60));

    let parser = LocalizedTextParser::new(&config.labels)?;
    let runner = ProcessRunner::from_config(&config);
    let outcome = ExperimentDriver::new(&config, runner, parser).run()?;

    // The dump goes first so a rendering failure cannot lose the measurements.
    persist::save_results(&outcome.grid, &config.results_path)
        .with_context(|| format!("writing {}", config.results_path.display()))?;
    println!("\n💾 Results saved: {}", config.results_path.display());

    if !cli.no_chart {
        match BitmapRenderer::default().render(&outcome.grid, &config.chart_path) {
            Ok(()) => {
                println!("Chart saved: {}", config.chart_path.display());
                if config.show_chart {
                    present_chart(&SystemViewer, &config.chart_path);
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "chart rendering failed");
                eprintln!("⚠️  Chart not rendered: {err}");
            }
        }
    }

    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &ExperimentOutcome) {
    let summary = outcome.summary();
    println!(
        "\nTrials: {} succeeded, {} failed, {} timed out (of {})",
        summary.succeeded,
        summary.failed,
        summary.timed_out,
        summary.total()
    );
    if summary.determinant_mismatches > 0 {
        println!(
            "⚠️  {} trial(s) reported a determinant different from the first one recorded",
            summary.determinant_mismatches
        );
    }
    for (name, series) in outcome.grid.iter() {
        let best = series
            .speedup()
            .iter()
            .zip(series.threads())
            .max_by(|a, b| a.0.total_cmp(b.0));
        match best {
            Some((speedup, threads)) => {
                println!("  {name}: best speedup {speedup:.2}x at {threads} threads");
            }
            None => println!("  {name}: no successful trials"),
        }
    }
}
