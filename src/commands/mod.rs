// src/commands/mod.rs

//! Command-file handling.
//!
//! - [`parser`] turns one line into a [`JobDescriptor`].
//! - [`job_set`] collects descriptors in file order.
//! - [`loader`] streams a file through the parser.

pub mod job_set;
pub mod loader;
pub mod parser;

pub use job_set::{JobSet, JobSetBuilder};
pub use loader::{load_job_set, read_job_set};
pub use parser::{JobDescriptor, LineError, parse_line};
