use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail};
use chrono::Local;
use parallel_runner::commands::JobDescriptor;
use parallel_runner::exec::{
    ExitFuture, ExitReport, LaunchedProcess, OUTPUT_CHANNEL_CAPACITY, OutputLine, ProcessBackend,
    Stream,
};
use tokio::sync::mpsc;

/// Scripted behaviour of one fake executable.
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub exit_code: i32,
    pub launch_error: Option<String>,
    pub wait_error: Option<String>,
    pub panic_on_wait: bool,
    pub run_for: Duration,
}

impl FakeScript {
    pub fn exits(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::default()
        }
    }

    pub fn stdout_line(mut self, line: impl Into<String>) -> Self {
        self.stdout.push(line.into());
        self
    }

    pub fn stderr_line(mut self, line: impl Into<String>) -> Self {
        self.stderr.push(line.into());
        self
    }

    pub fn fails_to_launch(msg: impl Into<String>) -> Self {
        Self {
            launch_error: Some(msg.into()),
            ..Self::default()
        }
    }

    pub fn fails_while_waiting(mut self, msg: impl Into<String>) -> Self {
        self.wait_error = Some(msg.into());
        self
    }

    /// The exit future panics instead of resolving, taking the job task down.
    pub fn panics_while_waiting(mut self) -> Self {
        self.panic_on_wait = true;
        self
    }

    pub fn runs_for(mut self, duration: Duration) -> Self {
        self.run_for = duration;
        self
    }
}

/// Observations shared between a [`FakeBackend`] and the test.
#[derive(Debug, Clone, Default)]
pub struct FakeStats {
    launched: Arc<Mutex<Vec<JobDescriptor>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeStats {
    /// Descriptors in the order they were launched.
    pub fn launched(&self) -> Vec<JobDescriptor> {
        self.launched.lock().unwrap().clone()
    }

    /// Highest number of fake processes alive at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A backend that never touches the OS.
///
/// - Known executables behave as scripted.
/// - Unknown executables fail to launch like a missing binary would.
/// - Pids are handed out sequentially from `pid_base`.
#[derive(Debug)]
pub struct FakeBackend {
    scripts: HashMap<String, FakeScript>,
    next_pid: AtomicU32,
    stats: FakeStats,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::with_pid_base(40000)
    }

    pub fn with_pid_base(base: u32) -> Self {
        Self {
            scripts: HashMap::new(),
            next_pid: AtomicU32::new(base),
            stats: FakeStats::default(),
        }
    }

    pub fn script(mut self, executable: &str, script: FakeScript) -> Self {
        self.scripts.insert(executable.to_string(), script);
        self
    }

    pub fn stats(&self) -> FakeStats {
        self.stats.clone()
    }
}

impl ProcessBackend for FakeBackend {
    fn launch(&self, job: &JobDescriptor) -> anyhow::Result<LaunchedProcess> {
        let script = self
            .scripts
            .get(&job.executable)
            .cloned()
            .ok_or_else(|| anyhow!("launching `{}`: No such file or directory", job.executable))?;
        if let Some(msg) = &script.launch_error {
            bail!("launching `{}`: {msg}", job.executable);
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.stats.launched.lock().unwrap().push(job.clone());
        let now_active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now_active, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let FakeScript {
            stdout,
            stderr,
            exit_code,
            wait_error,
            panic_on_wait,
            run_for,
            ..
        } = script;

        tokio::spawn(async move {
            let lines = stdout
                .into_iter()
                .map(|l| (Stream::Stdout, l))
                .chain(stderr.into_iter().map(|l| (Stream::Stderr, l)));
            for (stream, text) in lines {
                if tx.send(OutputLine::new(stream, text)).await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        let active = Arc::clone(&self.stats.active);
        let exit: ExitFuture = Box::pin(async move {
            tokio::time::sleep(run_for).await;
            active.fetch_sub(1, Ordering::SeqCst);
            if panic_on_wait {
                panic!("fake process {pid} panicked while waiting");
            }
            match wait_error {
                Some(msg) => Err(anyhow!(msg)),
                None => Ok(ExitReport {
                    code: exit_code,
                    ended_at: Local::now(),
                }),
            }
        });

        Ok(LaunchedProcess {
            pid,
            started_at: Local::now(),
            output: rx,
            exit,
        })
    }
}
