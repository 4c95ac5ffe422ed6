// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::Path;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::commands::load_job_set;
use crate::config::{RunnerConfig, resolve_config};
use crate::engine::{
    Console, CpuTopology, Orchestrator, OrchestratorOptions, Reporter, RunSummary, Terminal,
};
use crate::errors::Result;
use crate::exec::{ProcessBackend, TokioProcessBackend};
use crate::fs::{FileSystem, RealFileSystem};

/// Exit status when the command line is unusable (no command file).
pub const EXIT_USAGE: i32 = 2;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - usage / version handling
/// - config loading and CLI overrides
/// - command-file loading
/// - orchestration and the final report
///
/// Returns the process exit status.
pub async fn run(args: CliArgs) -> Result<i32> {
    if !args.ignored.is_empty() {
        debug!(ignored = ?args.ignored, "ignoring unrecognized arguments");
    }

    if args.version {
        print_usage();
        return Ok(0);
    }

    let fs = RealFileSystem;
    let Some(file) = args.file.as_deref().filter(|path| fs.is_file(path)) else {
        print_usage();
        return Ok(EXIT_USAGE);
    };

    let config = resolve_config(&fs, args.config.as_deref())?.with_cli_overrides(&args)?;
    let console = Console::new(Terminal::stdio(config.color()), config.time_format());

    let summary = run_file(&config, &fs, file, TokioProcessBackend::new(), console).await?;
    Ok(summary.exit_code(config.exit_policy(), config.fail_on_stderr()))
}

/// Load `path`, run every job on `backend` and print the report on
/// `console`.
///
/// A malformed command file is rejected before anything is launched.
pub async fn run_file<B: ProcessBackend>(
    config: &RunnerConfig,
    fs: &dyn FileSystem,
    path: &Path,
    backend: B,
    console: Console,
) -> Result<RunSummary> {
    let jobs = load_job_set(fs, path)?;

    if config.cpu_banner() {
        for line in CpuTopology::detect().lines() {
            console.line(&line);
        }
    }

    info!(path = ?path, jobs = jobs.len(), "starting run");

    let options = OrchestratorOptions {
        max_parallel: config.max_parallel(),
    };
    let orchestrator = Orchestrator::new(backend, options);
    let run = orchestrator.run(jobs, &console).await;

    let reporter = Reporter::new(console.aligned(run.column_width));
    let summary = reporter.report(&run.records);

    info!(?summary, "run finished");
    Ok(summary)
}

/// The usage / version banner.
pub fn usage_text() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        "Runner. Version:{version}
 Will run multiple command lines in parallel. Pass in a command file.
 Each line in the file is a command line to execute in parallel.
 There is also optionally a name for each process used when reporting.
Usage:
 runner -file commandList.txt
File Format:
: [name 1] : command1 args
: [name 2] : command2 args
: [name 3] : command3 args
\"path with spaces/command4\" args"
    )
}

fn print_usage() {
    println!("{}", usage_text());
}
