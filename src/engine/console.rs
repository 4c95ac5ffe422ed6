// src/engine/console.rs

//! The single, lock-protected console shared by every job and the reporter.
//!
//! Every printed unit goes through [`Console`] and is written while holding
//! one mutex: color attributes, text, attribute reset and the trailing
//! newline. Two jobs can therefore interleave whole lines but never tear a
//! line or leak a color into another job's output.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use tracing::debug;

use crate::exec::{OutputLine, Stream};
use crate::types::ColorMode;

/// Width reserved for the timestamp column.
pub const TIME_COLUMN_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Out,
    Err,
}

/// Raw output sinks plus whether highlighting is emitted.
pub struct Terminal {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    color: bool,
}

impl Terminal {
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>, color: bool) -> Self {
        Self { out, err, color }
    }

    /// The process's own stdout/stderr.
    pub fn stdio(mode: ColorMode) -> Self {
        let color = mode.enabled(io::stderr().is_terminal());
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), color)
    }

    fn write_line(&mut self, target: Target, highlight: bool, text: &str) -> io::Result<()> {
        let color = self.color;
        let w = match target {
            Target::Out => &mut self.out,
            Target::Err => &mut self.err,
        };

        if highlight && color {
            queue!(
                w,
                SetBackgroundColor(Color::DarkRed),
                SetForegroundColor(Color::White),
                Print(text),
                ResetColor
            )?;
        } else {
            w.write_all(text.as_bytes())?;
        }
        // The newline goes after the reset so the highlight never spills
        // onto the next line.
        w.write_all(b"\n")?;
        w.flush()
    }
}

/// Cloneable handle to the shared terminal.
///
/// A console carries the column width used to right-align job names. It
/// starts at 0 and is fixed with [`Console::aligned`] once every name is
/// known.
#[derive(Clone)]
pub struct Console {
    terminal: Arc<Mutex<Terminal>>,
    time_format: Arc<str>,
    width: usize,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("time_format", &self.time_format)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// `time_format` must be a valid `chrono` strftime pattern (checked by
    /// config validation).
    pub fn new(terminal: Terminal, time_format: impl Into<Arc<str>>) -> Self {
        Self {
            terminal: Arc::new(Mutex::new(terminal)),
            time_format: time_format.into(),
            width: 0,
        }
    }

    /// A handle to the same terminal with the name column fixed to `width`.
    pub fn aligned(&self, width: usize) -> Self {
        Self {
            terminal: Arc::clone(&self.terminal),
            time_format: Arc::clone(&self.time_format),
            width,
        }
    }

    /// Format a timestamp with the configured pattern.
    pub fn timestamp(&self, at: DateTime<Local>) -> String {
        at.format(&self.time_format).to_string()
    }

    /// `<name>:<time>-`, with the name right-aligned to the column width.
    pub fn prefix(&self, name: &str, at: DateTime<Local>) -> String {
        format!(
            "{name:>width$}:{time:>tw$}-",
            width = self.width,
            time = self.timestamp(at),
            tw = TIME_COLUMN_WIDTH
        )
    }

    pub fn line(&self, text: &str) {
        self.emit(Target::Out, false, text);
    }

    pub fn blank(&self) {
        self.emit(Target::Out, false, "");
    }

    pub fn start(&self, name: &str, at: DateTime<Local>) {
        let text = format!("{}START", self.prefix(name, at));
        self.emit(Target::Out, false, &text);
    }

    /// Stdout lines go to stdout; stderr lines are highlighted on stderr.
    pub fn output(&self, name: &str, line: &OutputLine) {
        let text = format!("{}{}", self.prefix(name, line.received_at), line.text);
        match line.stream {
            Stream::Stdout => self.emit(Target::Out, false, &text),
            Stream::Stderr => self.emit(Target::Err, true, &text),
        }
    }

    pub fn exit(&self, name: &str, at: DateTime<Local>, code: i32) {
        let text = format!("{}Exit Code:{code}", self.prefix(name, at));
        self.emit(Target::Out, false, &text);
    }

    /// Summary row; highlighted on stderr when the code is non-zero.
    pub fn summary(&self, name: &str, elapsed_secs: i64, code: i32) {
        let text = format!(
            "{name:>width$}:{elapsed_secs:>tw$}s ExitCode:{code}",
            width = self.width,
            tw = TIME_COLUMN_WIDTH
        );
        if code == 0 {
            self.emit(Target::Out, false, &text);
        } else {
            self.emit(Target::Err, true, &text);
        }
    }

    pub fn exception(&self, name: &str, at: DateTime<Local>, error: &str) {
        let text = format!("{}EXCEPTION:{error}", self.prefix(name, at));
        self.emit(Target::Err, true, &text);
    }

    fn emit(&self, target: Target, highlight: bool, text: &str) {
        let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = terminal.write_line(target, highlight, text) {
            debug!(error = %e, "console write failed");
        }
    }
}
