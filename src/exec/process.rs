// src/exec/process.rs

//! Real process backend on top of `tokio::process`.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::commands::JobDescriptor;

use super::backend::{
    ExitFuture, ExitReport, LaunchedProcess, OUTPUT_CHANNEL_CAPACITY, OutputLine, ProcessBackend,
    Stream,
};

/// Launches jobs as OS processes.
///
/// Each process gets a null stdin and piped stdout/stderr. Children are
/// killed if their handle is dropped before they exit.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessBackend {
    working_dir: Option<PathBuf>,
}

impl TokioProcessBackend {
    /// Backend that starts processes in the runner's working directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl ProcessBackend for TokioProcessBackend {
    fn launch(&self, job: &JobDescriptor) -> Result<LaunchedProcess> {
        let working_dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("resolving working directory")?,
        };

        let mut cmd = Command::new(&job.executable);
        apply_arguments(&mut cmd, &job.arguments)?;
        cmd.current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("launching `{}`", job.executable))?;
        let started_at = Local::now();
        let pid = child.id().unwrap_or_default();

        info!(
            executable = %job.executable,
            arguments = %job.arguments,
            pid,
            "process launched"
        );

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, Stream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, Stream::Stderr, tx);
        }

        let executable = job.executable.clone();
        let exit: ExitFuture = Box::pin(async move {
            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for `{executable}` (pid {pid})"))?;

            Ok::<_, anyhow::Error>(ExitReport {
                code: status.code().unwrap_or(-1),
                ended_at: Local::now(),
            })
        });

        Ok(LaunchedProcess {
            pid,
            started_at,
            output: rx,
            exit,
        })
    }
}

/// The argument string goes to the OS as written.
#[cfg(windows)]
fn apply_arguments(cmd: &mut Command, arguments: &str) -> Result<()> {
    if !arguments.is_empty() {
        cmd.raw_arg(arguments);
    }
    Ok(())
}

/// There is no raw command line on Unix; split into argv with POSIX word
/// rules (quotes and backslashes), without any expansion.
#[cfg(not(windows))]
fn apply_arguments(cmd: &mut Command, arguments: &str) -> Result<()> {
    let argv = shlex::split(arguments)
        .with_context(|| format!("unbalanced quoting in arguments: {arguments}"))?;
    cmd.args(argv);
    Ok(())
}

/// Forward every line of `reader` into `tx` until EOF.
///
/// Lines are decoded lossily so that non-UTF-8 output is still shown.
fn spawn_line_reader<R>(reader: R, stream: Stream, tx: mpsc::Sender<OutputLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = OutputLine::new(stream, decode_line(&buf));
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(?stream, error = %e, "output reader stopped");
                    break;
                }
            }
        }
    });
}

/// Strip the line terminator (`\n` or `\r\n`) and decode.
pub fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
