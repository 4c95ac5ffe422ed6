// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The runner has always accepted Windows-style spellings such as
//! `-file list.txt`, `/file list.txt`, `-?` and `-Version`, matched
//! case-insensitively, and silently skipped anything it did not recognize.
//! [`normalize_args`] rewrites that surface into the long flags `clap`
//! understands before parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::{ColorMode, ExitPolicy};

/// Command-line arguments for `runner`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "runner",
    about = "Run every command line of a command file in parallel.",
    long_about = None,
    disable_version_flag = true,
    args_override_self = true
)]
pub struct CliArgs {
    /// Command file: one command line per non-blank line.
    ///
    /// The token after the flag is always the path, even if it starts with
    /// `-`. When given more than once, the last one wins.
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub file: Option<PathBuf>,

    /// Print the version and usage banner, then exit.
    #[arg(long)]
    pub version: bool,

    /// Path to a TOML config file.
    ///
    /// Default: `Runner.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of jobs running at the same time (default: no limit).
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// How job results map to the runner's exit status.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub exit_policy: Option<ExitPolicy>,

    /// Do not count stderr output from a job as a failure for the exit
    /// status.
    #[arg(long)]
    pub allow_stderr: bool,

    /// When to highlight errors with terminal colors.
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// Skip the CPU banner printed before the run.
    #[arg(long)]
    pub no_banner: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Arguments dropped by [`normalize_args`].
    #[arg(skip)]
    pub ignored: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Result of rewriting the raw argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedArgs {
    /// Program name followed by clap-ready arguments.
    pub args: Vec<String>,
    /// Arguments that were not recognized and will be skipped.
    pub ignored: Vec<String>,
}

const VERSION_ALIASES: &[&str] = &["v", "?", "version"];
const HELP_ALIASES: &[&str] = &["h", "help"];
const VALUE_FLAGS: &[&str] = &[
    "file",
    "config",
    "max-parallel",
    "exit-policy",
    "color",
    "log-level",
];
const SWITCH_FLAGS: &[&str] = &["allow-stderr", "no-banner"];

/// Rewrite legacy and case-variant spellings into canonical long flags.
///
/// The first element is taken to be the program name and kept as is.
/// Flag values are passed through untouched; only flag names are lowered.
/// A value flag at the end of the list with no value is dropped.
pub fn normalize_args<I, S>(raw: I) -> NormalizedArgs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut iter = raw.into_iter().map(Into::into);
    let mut out = NormalizedArgs::default();
    out.args.push(iter.next().unwrap_or_else(|| "runner".to_string()));

    while let Some(arg) = iter.next() {
        let Some(body) = flag_body(&arg) else {
            out.ignored.push(arg);
            continue;
        };

        let (name, inline_value) = match body.split_once('=') {
            Some((name, value)) => (name.to_lowercase(), Some(value.to_string())),
            None => (body.to_lowercase(), None),
        };

        if VERSION_ALIASES.contains(&name.as_str()) {
            out.args.push("--version".to_string());
        } else if HELP_ALIASES.contains(&name.as_str()) {
            out.args.push("--help".to_string());
        } else if VALUE_FLAGS.contains(&name.as_str()) {
            match inline_value.or_else(|| iter.next()) {
                Some(value) => {
                    out.args.push(format!("--{name}"));
                    out.args.push(value);
                }
                None => out.ignored.push(arg),
            }
        } else if SWITCH_FLAGS.contains(&name.as_str()) {
            out.args.push(format!("--{name}"));
        } else {
            out.ignored.push(arg);
        }
    }

    out
}

/// Strip `--`, `-` or `/` from a flag-looking argument.
fn flag_body(arg: &str) -> Option<&str> {
    let body = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))
        .or_else(|| arg.strip_prefix('/'))?;
    (!body.is_empty()).then_some(body)
}

/// Parse a raw argument list (program name first).
pub fn parse_from<I, S>(raw: I) -> CliArgs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let normalized = normalize_args(raw);
    let mut args = CliArgs::parse_from(normalized.args);
    args.ignored = normalized.ignored;
    args
}

/// Parse the process arguments.
pub fn parse() -> CliArgs {
    parse_from(
        std::env::args_os().map(|arg: OsString| arg.to_string_lossy().into_owned()),
    )
}
