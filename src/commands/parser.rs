// src/commands/parser.rs

//! Grammar for a single command-file line.
//!
//! ```text
//! [: <name> :] ["<path with spaces>" | <path>] <arguments>
//! ```
//!
//! Every clause is trimmed on its left before the next one is read. The
//! argument string keeps its trailing whitespace so it reaches the process
//! exactly as written.

use thiserror::Error;

/// Why a line could not be turned into a [`JobDescriptor`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("name clause starting with ':' has no closing ':'")]
    UnterminatedName,

    #[error("quoted executable path has no closing '\"'")]
    UnterminatedQuote,

    #[error("no executable given")]
    MissingExecutable,
}

/// Immutable, parsed description of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Display name from the `: name :` clause, if one was given and is not
    /// blank. Unnamed jobs are labelled with their process id at launch.
    pub name: Option<String>,
    pub executable: String,
    pub arguments: String,
}

impl JobDescriptor {
    pub fn new(
        name: Option<&str>,
        executable: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            name: name.map(str::to_string),
            executable: executable.into(),
            arguments: arguments.into(),
        }
    }

    /// Length of the explicit name in characters, or 0 for unnamed jobs.
    pub fn name_width(&self) -> usize {
        self.name.as_deref().map_or(0, |n| n.chars().count())
    }
}

/// Parse one raw line.
///
/// Returns `Ok(None)` for empty and whitespace-only lines.
pub fn parse_line(raw: &str) -> Result<Option<JobDescriptor>, LineError> {
    let mut rest = raw.trim_start();
    if rest.is_empty() {
        return Ok(None);
    }

    let mut name = None;
    if let Some(after_colon) = rest.strip_prefix(':') {
        let end = after_colon.find(':').ok_or(LineError::UnterminatedName)?;
        let candidate = after_colon[..end].trim();
        if !candidate.is_empty() {
            name = Some(candidate.to_string());
        }
        rest = after_colon[end + 1..].trim_start();
    }

    let (executable, arguments) = if let Some(after_quote) = rest.strip_prefix('"') {
        let end = after_quote.find('"').ok_or(LineError::UnterminatedQuote)?;
        (&after_quote[..end], after_quote[end + 1..].trim_start())
    } else {
        match rest.find(char::is_whitespace) {
            Some(end) => (&rest[..end], rest[end..].trim_start()),
            None => (rest, ""),
        }
    };

    if executable.trim().is_empty() {
        return Err(LineError::MissingExecutable);
    }

    Ok(Some(JobDescriptor {
        name,
        executable: executable.to_string(),
        arguments: arguments.to_string(),
    }))
}
