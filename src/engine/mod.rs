// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the shared, synchronized [`console`] every job prints through
//! - the [`orchestrator`] that launches all jobs and collects their records
//! - the [`report`] printed once every job has reached a terminal state
//! - the informational CPU [`banner`]

use chrono::{DateTime, Local, TimeDelta};

use crate::commands::JobDescriptor;

pub mod banner;
pub mod console;
pub mod orchestrator;
pub mod report;

pub use banner::CpuTopology;
pub use console::{Console, Terminal};
pub use orchestrator::{OrchestratedRun, Orchestrator, OrchestratorOptions};
pub use report::{Reporter, RunSummary};

/// A failure captured while launching or waiting on a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// When the failure was captured.
    pub at: DateTime<Local>,
    /// Set if the process had started before the failure.
    pub started_at: Option<DateTime<Local>>,
    /// Rendered error chain.
    pub error: String,
}

impl JobFailure {
    pub fn new(error: &anyhow::Error, started_at: Option<DateTime<Local>>) -> Self {
        Self {
            at: Local::now(),
            started_at,
            error: format!("{error:#}"),
        }
    }
}

/// Terminal state of one job. Exactly one of the two ever applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Exited {
        started_at: DateTime<Local>,
        ended_at: DateTime<Local>,
        exit_code: i32,
    },
    Failed(JobFailure),
}

/// Final record for one command-file entry, kept at its file position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// Zero-based position in the command file (blank lines not counted).
    pub index: usize,
    /// Name used on every printed line: the explicit name, else the pid,
    /// else `#<position>` when no process ever existed.
    /// See [`job_label`].
    pub name: String,
    pub descriptor: JobDescriptor,
    pub pid: Option<u32>,
    pub outcome: JobOutcome,
    /// Non-empty lines the job wrote to stderr.
    pub stderr_lines: usize,
}

impl JobRecord {
    /// Record for a job whose process could not be started, or whose task
    /// died before producing a result. `pid` is set if a process had been
    /// launched, so the job keeps the name it printed under.
    pub fn failed(
        index: usize,
        descriptor: JobDescriptor,
        pid: Option<u32>,
        failure: JobFailure,
    ) -> Self {
        Self {
            index,
            name: job_label(index, &descriptor, pid),
            descriptor,
            pid,
            outcome: JobOutcome::Failed(failure),
            stderr_lines: 0,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            JobOutcome::Exited { exit_code, .. } => Some(exit_code),
            JobOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.outcome {
            JobOutcome::Failed(failure) => Some(failure),
            JobOutcome::Exited { .. } => None,
        }
    }

    /// Wall-clock run time of a job that exited.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        match self.outcome {
            JobOutcome::Exited {
                started_at,
                ended_at,
                ..
            } => Some(ended_at - started_at),
            JobOutcome::Failed(_) => None,
        }
    }
}

/// Display label of a job: its explicit name, else its pid, else
/// `#<position>` (1-based) when no process was ever launched.
pub fn job_label(index: usize, descriptor: &JobDescriptor, pid: Option<u32>) -> String {
    match (&descriptor.name, pid) {
        (Some(name), _) => name.clone(),
        (None, Some(pid)) => pid.to_string(),
        (None, None) => format!("#{}", index + 1),
    }
}
