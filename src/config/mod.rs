// src/config/mod.rs

//! Configuration loading and validation for the runner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file through the filesystem abstraction (`loader.rs`).
//! - Validate values that serde alone cannot check (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{DisplaySection, RawRunnerConfig, RunSection, RunnerConfig};
