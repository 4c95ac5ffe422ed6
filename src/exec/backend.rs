// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The orchestrator talks to a `ProcessBackend` instead of
//! `tokio::process` directly. This makes it easy to swap in a fake backend in
//! tests while keeping the production implementation in [`super::process`].
//!
//! A launched process is handed back as plain data: its pid and start time,
//! a receiver of captured output lines, and a future that resolves once the
//! process has exited.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use crate::commands::JobDescriptor;

/// Capacity of the per-job output channel.
pub const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Which pipe a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One captured line, stamped with the time it arrived at the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: Stream,
    pub received_at: DateTime<Local>,
    pub text: String,
}

impl OutputLine {
    pub fn new(stream: Stream, text: impl Into<String>) -> Self {
        Self {
            stream,
            received_at: Local::now(),
            text: text.into(),
        }
    }
}

/// Terminal state of a process that exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code; `-1` when the OS reports none (e.g. killed by a signal).
    pub code: i32,
    pub ended_at: DateTime<Local>,
}

pub type ExitFuture = Pin<Box<dyn Future<Output = anyhow::Result<ExitReport>> + Send>>;

/// A process that has been started.
///
/// `output` closes once both stdout and stderr reached end of file; only
/// then should `exit` be awaited so the exit line follows all output.
pub struct LaunchedProcess {
    pub pid: u32,
    pub started_at: DateTime<Local>,
    pub output: mpsc::Receiver<OutputLine>,
    pub exit: ExitFuture,
}

impl fmt::Debug for LaunchedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how a job's process is started.
///
/// Production code uses [`super::TokioProcessBackend`]; tests can provide
/// their own implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync + 'static {
    /// Start the process for `job`.
    ///
    /// An error here is a launch failure (missing executable, permission
    /// denied, unparsable arguments) and is recorded against the job.
    fn launch(&self, job: &JobDescriptor) -> anyhow::Result<LaunchedProcess>;
}
