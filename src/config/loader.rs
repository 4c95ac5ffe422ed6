// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawRunnerConfig, RunnerConfig};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Load a configuration file and return the raw, unvalidated sections.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the semantic checks.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawRunnerConfig> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;

    let config: RawRunnerConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RunnerConfig> {
    let raw_config = load_from_path(fs, &path)?;
    let config = RunnerConfig::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - An explicit path must exist and be valid.
/// - Otherwise `Runner.toml` in the working directory is used if present.
/// - Otherwise built-in defaults apply.
pub fn resolve_config(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<RunnerConfig> {
    if let Some(path) = explicit {
        debug!(path = ?path, "loading config from --config");
        return load_and_validate(fs, path);
    }

    let fallback = default_config_path();
    if fs.is_file(&fallback) {
        debug!(path = ?fallback, "loading config from working directory");
        return load_and_validate(fs, &fallback);
    }

    debug!("no config file; using defaults");
    Ok(RunnerConfig::default())
}

/// `Runner.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Runner.toml")
}
