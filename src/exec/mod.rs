// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the data a launched
//!   process hands back (pid, start time, output lines, exit future).
//! - [`process`] is the production backend using `tokio::process::Command`.
//! - [`job_runner`] drives one launched process: START line, output relay,
//!   exit line.

pub mod backend;
pub mod job_runner;
pub mod process;

pub use backend::{
    ExitFuture, ExitReport, LaunchedProcess, OUTPUT_CHANNEL_CAPACITY, OutputLine, ProcessBackend,
    Stream,
};
pub use job_runner::{JobRun, run_job};
pub use process::TokioProcessBackend;
