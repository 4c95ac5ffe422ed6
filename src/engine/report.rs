// src/engine/report.rs

//! End-of-run summary.

use crate::types::ExitPolicy;

use super::console::Console;
use super::{JobOutcome, JobRecord};

pub const COMPLETION_BANNER: &str = "[All Operations Completed]";

/// Counts over all job records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    /// Exited with code 0.
    pub passed: usize,
    /// Exited with a non-zero code.
    pub exited_nonzero: usize,
    /// Could not be launched or waited on.
    pub failed_to_run: usize,
    /// Wrote at least one line to stderr, whatever their exit code.
    pub wrote_stderr: usize,
}

impl RunSummary {
    pub fn from_records(records: &[JobRecord]) -> Self {
        let mut summary = RunSummary {
            total: records.len(),
            ..RunSummary::default()
        };

        for record in records {
            match &record.outcome {
                JobOutcome::Exited { exit_code: 0, .. } => summary.passed += 1,
                JobOutcome::Exited { .. } => summary.exited_nonzero += 1,
                JobOutcome::Failed(_) => summary.failed_to_run += 1,
            }
            if record.stderr_lines > 0 {
                summary.wrote_stderr += 1;
            }
        }

        summary
    }

    /// True when any job failed to run or exited non-zero.
    pub fn has_failures(&self) -> bool {
        self.exited_nonzero > 0 || self.failed_to_run > 0
    }

    /// Exit status of the runner itself.
    pub fn exit_code(&self, policy: ExitPolicy, fail_on_stderr: bool) -> i32 {
        match policy {
            ExitPolicy::Lenient => 0,
            ExitPolicy::Strict => {
                let stderr_counts = fail_on_stderr && self.wrote_stderr > 0;
                if self.has_failures() || stderr_counts { 1 } else { 0 }
            }
        }
    }
}

/// Prints the summary block once every job is done.
#[derive(Debug, Clone)]
pub struct Reporter {
    console: Console,
}

impl Reporter {
    /// `console` must already be aligned to the run's column width.
    pub fn new(console: Console) -> Self {
        Self { console }
    }

    pub fn report(&self, records: &[JobRecord]) -> RunSummary {
        self.console.blank();
        self.console.line(COMPLETION_BANNER);
        self.console.line("Summary:");

        for record in records {
            match &record.outcome {
                JobOutcome::Exited { exit_code, .. } => {
                    let elapsed = record.elapsed().map_or(0, |d| d.num_seconds());
                    self.console.summary(&record.name, elapsed, *exit_code);
                }
                JobOutcome::Failed(failure) => {
                    self.console
                        .exception(&record.name, failure.at, &failure.error);
                }
            }
        }

        RunSummary::from_records(records)
    }
}
