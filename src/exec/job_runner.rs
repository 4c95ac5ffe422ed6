// src/exec/job_runner.rs

//! Drives one launched process to completion.

use tracing::{debug, info, warn};

use crate::engine::{Console, JobFailure, JobOutcome};

use super::backend::{LaunchedProcess, Stream};

/// What a job left behind once it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    pub outcome: JobOutcome,
    pub stderr_lines: usize,
}

/// Print the job's START line, relay its output, then wait for it to exit.
///
/// Output is drained until both pipes are closed before the exit status is
/// awaited, so the exit line is always the job's last line. A failure while
/// waiting is captured in the outcome; no exit line is printed for it.
pub async fn run_job(name: &str, process: LaunchedProcess, console: &Console) -> JobRun {
    let LaunchedProcess {
        pid,
        started_at,
        mut output,
        exit,
    } = process;

    console.start(name, started_at);

    let mut stderr_lines = 0;
    while let Some(line) = output.recv().await {
        if line.text.is_empty() {
            continue;
        }
        if line.stream == Stream::Stderr {
            stderr_lines += 1;
        }
        console.output(name, &line);
    }
    debug!(job = %name, pid, "output streams closed");

    let outcome = match exit.await {
        Ok(report) => {
            info!(job = %name, pid, exit_code = report.code, "job exited");
            console.exit(name, report.ended_at, report.code);
            JobOutcome::Exited {
                started_at,
                ended_at: report.ended_at,
                exit_code: report.code,
            }
        }
        Err(err) => {
            warn!(job = %name, pid, error = %err, "waiting for job failed");
            JobOutcome::Failed(JobFailure::new(&err, Some(started_at)))
        }
    };

    JobRun {
        outcome,
        stderr_lines,
    }
}
