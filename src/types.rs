use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// How the outcome of the jobs maps onto the runner's own exit status.
///
/// - `Strict`: exit with a failure status when any job could not be run or
///   exited with a non-zero code (default).
/// - `Lenient`: always exit with status 0 once the run completes; job
///   failures are only visible in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    Strict,
    Lenient,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        ExitPolicy::Strict
    }
}

impl FromStr for ExitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ExitPolicy::Strict),
            "lenient" => Ok(ExitPolicy::Lenient),
            other => Err(format!(
                "invalid exit_policy: {other} (expected \"strict\" or \"lenient\")"
            )),
        }
    }
}

/// When to emit terminal color attributes for highlighted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Highlight only when the error stream is a terminal.
    Auto,
    Always,
    Never,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Auto
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!(
                "invalid color: {other} (expected \"auto\", \"always\" or \"never\")"
            )),
        }
    }
}

impl ColorMode {
    /// Resolve the mode into a yes/no decision for a stream.
    pub fn enabled(self, stream_is_terminal: bool) -> bool {
        match self {
            ColorMode::Auto => stream_is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}
