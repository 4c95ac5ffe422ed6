#![allow(dead_code)]

use parallel_runner::config::{RawRunnerConfig, RunnerConfig};
use parallel_runner::types::ExitPolicy;

/// Builder for `RunnerConfig` to simplify test setup.
///
/// Starts from defaults with the CPU banner switched off so captured output
/// only contains job lines.
pub struct RunnerConfigBuilder {
    config: RawRunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawRunnerConfig::default();
        config.display.cpu_banner = false;
        Self { config }
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.run.max_parallel = Some(n);
        self
    }

    pub fn exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.config.run.exit_policy = policy;
        self
    }

    pub fn fail_on_stderr(mut self, val: bool) -> Self {
        self.config.run.fail_on_stderr = val;
        self
    }

    pub fn cpu_banner(mut self, val: bool) -> Self {
        self.config.display.cpu_banner = val;
        self
    }

    pub fn time_format(mut self, format: &str) -> Self {
        self.config.display.time_format = format.to_string();
        self
    }

    pub fn build(self) -> RunnerConfig {
        RunnerConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for command-file text.
#[derive(Default)]
pub struct CommandFileBuilder {
    lines: Vec<String>,
}

impl CommandFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &str, executable: &str, args: &str) -> Self {
        self.lines
            .push(format!(": {name} : {executable} {args}").trim_end().to_string());
        self
    }

    pub fn unnamed(mut self, executable: &str, args: &str) -> Self {
        self.lines
            .push(format!("{executable} {args}").trim_end().to_string());
        self
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn blank(self) -> Self {
        self.raw("")
    }

    pub fn build(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
