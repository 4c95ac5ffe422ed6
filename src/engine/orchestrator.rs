// src/engine/orchestrator.rs

//! Fan-out / fan-in of all jobs in a command file.
//!
//! A run has two phases:
//!
//! 1. **Launch.** Jobs are launched in file order for as long as there are
//!    free slots (every job when no limit is set). Unnamed jobs get their
//!    pid as display name, so only now can the name column width be fixed.
//! 2. **Drive.** One Tokio task per job prints its START line, relays its
//!    output and waits for exit. Jobs that did not get a slot in phase 1
//!    wait for a permit inside their task, then launch.
//!
//! Failures stay inside the job's own task and come back as records; one job
//! can never abort another. Records are returned in file order.

use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use anyhow::anyhow;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::commands::{JobDescriptor, JobSet};
use crate::exec::{LaunchedProcess, ProcessBackend, run_job};

use super::console::Console;
use super::{JobFailure, JobRecord, job_label};

/// Column width reserved for an unnamed job that is still waiting for a
/// slot when the width is fixed: the digits of the largest 32-bit pid.
pub const UNLAUNCHED_NAME_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Maximum number of jobs running at once; `None` runs all at once.
    pub max_parallel: Option<NonZeroUsize>,
}

/// Everything the reporter needs once all jobs have finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratedRun {
    /// One record per job, in command-file order.
    pub records: Vec<JobRecord>,
    /// Name column width used for every job line.
    pub column_width: usize,
}

/// State of a job at the end of the launch phase.
enum Slot {
    Launched {
        process: LaunchedProcess,
        permit: OwnedSemaphorePermit,
    },
    LaunchFailed(JobFailure),
    Waiting,
}

struct PendingJob {
    index: usize,
    descriptor: JobDescriptor,
    slot: Slot,
}

impl PendingJob {
    /// Width this job contributes to the name column.
    fn label_width(&self) -> usize {
        if let Some(name) = &self.descriptor.name {
            return name.chars().count();
        }
        match &self.slot {
            Slot::Launched { process, .. } => process.pid.to_string().len(),
            Slot::LaunchFailed(_) => job_label(self.index, &self.descriptor, None).len(),
            Slot::Waiting => UNLAUNCHED_NAME_WIDTH,
        }
    }
}

/// Runs a job set against a [`ProcessBackend`].
pub struct Orchestrator<B: ProcessBackend> {
    backend: Arc<B>,
    options: OrchestratorOptions,
}

impl<B: ProcessBackend> std::fmt::Debug for Orchestrator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Orchestrator<B> {
    pub fn new(backend: B, options: OrchestratorOptions) -> Self {
        Self {
            backend: Arc::new(backend),
            options,
        }
    }

    /// Run every job to a terminal state and return their records.
    ///
    /// `console` is the shared console; the returned width is the one all
    /// job lines were printed with.
    pub async fn run(&self, jobs: JobSet, console: &Console) -> OrchestratedRun {
        let named_width = jobs.named_width();
        let permits = Arc::new(Semaphore::new(self.slot_count(jobs.len())));

        // Phase 1: launch.
        let pending: Vec<PendingJob> = jobs
            .into_jobs()
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| self.prepare(index, descriptor, &permits))
            .collect();

        let column_width = pending
            .iter()
            .map(PendingJob::label_width)
            .fold(named_width, usize::max);
        let console = console.aligned(column_width);

        info!(
            jobs = pending.len(),
            column_width,
            max_parallel = ?self.options.max_parallel,
            "launch phase complete"
        );

        // Phase 2: drive.
        let handles: Vec<_> = pending
            .into_iter()
            .map(|job| {
                let index = job.index;
                let descriptor = job.descriptor.clone();
                let pid = Arc::new(OnceLock::new());
                let handle = tokio::spawn(drive(
                    job,
                    Arc::clone(&self.backend),
                    Arc::clone(&permits),
                    console.clone(),
                    Arc::clone(&pid),
                ));
                (index, descriptor, pid, handle)
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for (index, descriptor, pid, handle) in handles {
            let record = match handle.await {
                Ok(record) => record,
                Err(join_err) => {
                    warn!(index, error = %join_err, "job task did not complete");
                    let err = anyhow!("job task did not complete: {join_err}");
                    // Keep the label the job's lines were printed under.
                    let pid = pid.get().copied();
                    let failure = JobFailure::new(&err, None);
                    JobRecord::failed(index, descriptor, pid, failure)
                }
            };
            records.push(record);
        }

        OrchestratedRun {
            records,
            column_width,
        }
    }

    fn slot_count(&self, job_count: usize) -> usize {
        self.options
            .max_parallel
            .map_or(job_count, NonZeroUsize::get)
            .min(Semaphore::MAX_PERMITS)
    }

    /// Launch the job now if a slot is free.
    fn prepare(
        &self,
        index: usize,
        descriptor: JobDescriptor,
        permits: &Arc<Semaphore>,
    ) -> PendingJob {
        let slot = match Arc::clone(permits).try_acquire_owned() {
            Ok(permit) => match self.backend.launch(&descriptor) {
                Ok(process) => Slot::Launched { process, permit },
                Err(err) => {
                    warn!(
                        index,
                        executable = %descriptor.executable,
                        error = %err,
                        "launch failed"
                    );
                    Slot::LaunchFailed(JobFailure::new(&err, None))
                }
            },
            Err(_) => {
                debug!(index, "no free slot; job will launch later");
                Slot::Waiting
            }
        };

        PendingJob {
            index,
            descriptor,
            slot,
        }
    }
}

/// Body of one job task.
///
/// `launched_pid` is filled as soon as a process exists, so the caller can
/// still name the job if this task dies.
async fn drive<B: ProcessBackend>(
    job: PendingJob,
    backend: Arc<B>,
    permits: Arc<Semaphore>,
    console: Console,
    launched_pid: Arc<OnceLock<u32>>,
) -> JobRecord {
    let PendingJob {
        index,
        descriptor,
        slot,
    } = job;

    // The permit is held until the job has fully finished.
    let (process, _permit) = match slot {
        Slot::Launched { process, permit } => (process, permit),
        Slot::LaunchFailed(failure) => return JobRecord::failed(index, descriptor, None, failure),
        Slot::Waiting => {
            let permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let err = anyhow!("waiting for a free slot: {e}");
                    let failure = JobFailure::new(&err, None);
                    return JobRecord::failed(index, descriptor, None, failure);
                }
            };
            match backend.launch(&descriptor) {
                Ok(process) => (process, permit),
                Err(err) => {
                    warn!(
                        index,
                        executable = %descriptor.executable,
                        error = %err,
                        "launch failed"
                    );
                    let failure = JobFailure::new(&err, None);
                    return JobRecord::failed(index, descriptor, None, failure);
                }
            }
        }
    };

    let pid = process.pid;
    let _ = launched_pid.set(pid);
    let name = job_label(index, &descriptor, Some(pid));
    let run = run_job(&name, process, &console).await;

    JobRecord {
        index,
        name,
        descriptor,
        pid: Some(pid),
        outcome: run.outcome,
        stderr_lines: run.stderr_lines,
    }
}
