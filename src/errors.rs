// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::commands::LineError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("malformed command on line {line}")]
    MalformedLine {
        line: usize,
        #[source]
        source: LineError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
