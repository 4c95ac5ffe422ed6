// src/config/validate.rs

use chrono::format::{Item, StrftimeItems};

use crate::config::model::{RawRunnerConfig, RunnerConfig};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawRunnerConfig> for RunnerConfig {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawRunnerConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RunnerConfig::new_unchecked(raw.run, raw.display))
    }
}

fn validate_raw_config(cfg: &RawRunnerConfig) -> Result<()> {
    validate_run_section(cfg)?;
    validate_time_format(&cfg.display.time_format)?;
    Ok(())
}

fn validate_run_section(cfg: &RawRunnerConfig) -> Result<()> {
    // exit_policy is strongly typed and checked during deserialization.
    if cfg.run.max_parallel == Some(0) {
        return Err(RunnerError::ConfigError(
            "[run].max_parallel must be >= 1 (got 0); omit it for no limit".to_string(),
        ));
    }
    Ok(())
}

/// An invalid strftime item would make `chrono` fail while formatting a
/// line mid-run, so reject it up front.
fn validate_time_format(format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(RunnerError::ConfigError(
            "[display].time_format must not be empty".to_string(),
        ));
    }

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(RunnerError::ConfigError(format!(
            "[display].time_format {:?} is not a valid strftime pattern",
            format
        )));
    }

    Ok(())
}
