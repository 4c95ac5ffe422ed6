// src/engine/banner.rs

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::Path;

use sysinfo::System;

/// Host CPU counts shown before a run. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTopology {
    /// Physical processor packages (sockets).
    pub packages: Option<usize>,
    pub physical_cores: Option<usize>,
    pub hardware_threads: usize,
}

impl CpuTopology {
    pub fn detect() -> Self {
        Self {
            packages: detect_packages(),
            physical_cores: System::new().physical_core_count(),
            hardware_threads: std::thread::available_parallelism()
                .map_or(1, NonZeroUsize::get),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Num CPUs        = {}", count_or_unknown(self.packages)),
            format!("Num CPU Cores   = {}", count_or_unknown(self.physical_cores)),
            format!("Num CPU Threads = {}", self.hardware_threads),
        ]
    }
}

fn count_or_unknown(count: Option<usize>) -> String {
    count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
}

/// sysinfo has no socket count; Linux exposes one id per logical CPU.
#[cfg(target_os = "linux")]
fn detect_packages() -> Option<usize> {
    count_packages(Path::new("/sys/devices/system/cpu"))
}

#[cfg(not(target_os = "linux"))]
fn detect_packages() -> Option<usize> {
    None
}

/// Number of distinct `cpuN/topology/physical_package_id` values under
/// `cpu_root`, or `None` when there are none to read.
pub fn count_packages(cpu_root: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(cpu_root).ok()?;
    let ids: BTreeSet<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.strip_prefix("cpu")
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .filter_map(|entry| {
            std::fs::read_to_string(entry.path().join("topology/physical_package_id")).ok()
        })
        .map(|id| id.trim().to_string())
        .collect();

    (!ids.is_empty()).then_some(ids.len())
}
