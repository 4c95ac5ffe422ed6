// src/commands/loader.rs

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, RunnerError};
use crate::fs::FileSystem;

use super::job_set::{JobSet, JobSetBuilder};
use super::parser::parse_line;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Read a command file through `fs` and build the job set.
///
/// The file is consumed line by line. The first malformed line aborts the
/// whole load so that a broken file never partially runs.
pub fn load_job_set(fs: &dyn FileSystem, path: &Path) -> Result<JobSet> {
    let reader = fs.open_read(path)?;
    let jobs = read_job_set(reader)?;
    debug!(path = ?path, jobs = jobs.len(), "loaded command file");
    Ok(jobs)
}

/// Parse command lines from any reader.
pub fn read_job_set(reader: impl Read) -> Result<JobSet> {
    let mut builder = JobSetBuilder::new();

    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let text = if idx == 0 {
            line.trim_start_matches(BYTE_ORDER_MARK)
        } else {
            line.as_str()
        };

        match parse_line(text) {
            Ok(Some(job)) => {
                builder.push(job);
            }
            Ok(None) => {}
            Err(source) => {
                return Err(RunnerError::MalformedLine {
                    line: idx + 1,
                    source,
                });
            }
        }
    }

    Ok(builder.build())
}
