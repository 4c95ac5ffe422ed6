// src/config/model.rs

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::cli::CliArgs;
use crate::types::{ColorMode, ExitPolicy};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// max_parallel = 4
/// exit_policy = "strict"
/// fail_on_stderr = true
///
/// [display]
/// time_format = "%H:%M:%S"
/// color = "auto"
/// cpu_banner = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRunnerConfig {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub display: DisplaySection,
}

/// `[run]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Upper bound on simultaneously running jobs.
    ///
    /// `None` (the default) launches every job at once.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// `"strict"` (default) or `"lenient"`.
    #[serde(default)]
    pub exit_policy: ExitPolicy,

    /// Count a job that wrote anything to stderr as failed when computing
    /// the runner's exit status. On by default.
    #[serde(default = "default_fail_on_stderr")]
    pub fail_on_stderr: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_parallel: None,
            exit_policy: ExitPolicy::default(),
            fail_on_stderr: default_fail_on_stderr(),
        }
    }
}

fn default_fail_on_stderr() -> bool {
    true
}

/// `[display]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    /// `chrono` strftime pattern for the timestamp column.
    #[serde(default = "default_time_format")]
    pub time_format: String,

    #[serde(default)]
    pub color: ColorMode,

    /// Print the CPU core/thread banner before launching jobs.
    #[serde(default = "default_cpu_banner")]
    pub cpu_banner: bool,
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

fn default_cpu_banner() -> bool {
    true
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            color: ColorMode::default(),
            cpu_banner: default_cpu_banner(),
        }
    }
}

/// Validated configuration. Only obtainable through
/// `RunnerConfig::try_from(RawRunnerConfig)` (see `validate.rs`) or
/// `RunnerConfig::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    run: RunSection,
    display: DisplaySection,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new_unchecked(RunSection::default(), DisplaySection::default())
    }
}

impl RunnerConfig {
    pub(crate) fn new_unchecked(run: RunSection, display: DisplaySection) -> Self {
        Self { run, display }
    }

    pub fn max_parallel(&self) -> Option<NonZeroUsize> {
        self.run.max_parallel.and_then(NonZeroUsize::new)
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        self.run.exit_policy
    }

    pub fn fail_on_stderr(&self) -> bool {
        self.run.fail_on_stderr
    }

    pub fn time_format(&self) -> &str {
        &self.display.time_format
    }

    pub fn color(&self) -> ColorMode {
        self.display.color
    }

    pub fn cpu_banner(&self) -> bool {
        self.display.cpu_banner
    }

    /// Give back the raw sections, e.g. to layer overrides and re-validate.
    pub fn into_raw(self) -> RawRunnerConfig {
        RawRunnerConfig {
            run: self.run,
            display: self.display,
        }
    }

    /// Apply command-line overrides on top of file values and re-validate.
    pub fn with_cli_overrides(self, args: &CliArgs) -> crate::errors::Result<Self> {
        let mut raw = self.into_raw();

        if let Some(n) = args.max_parallel {
            raw.run.max_parallel = Some(n);
        }
        if let Some(policy) = args.exit_policy {
            raw.run.exit_policy = policy;
        }
        if args.allow_stderr {
            raw.run.fail_on_stderr = false;
        }
        if let Some(color) = args.color {
            raw.display.color = color;
        }
        if args.no_banner {
            raw.display.cpu_banner = false;
        }

        RunnerConfig::try_from(raw)
    }
}
