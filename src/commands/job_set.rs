// src/commands/job_set.rs

use super::parser::JobDescriptor;

/// Ordered list of parsed jobs, in command-file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSet {
    jobs: Vec<JobDescriptor>,
    named_width: usize,
}

impl JobSet {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.jobs.iter()
    }

    /// Widest explicit display name. Unnamed jobs do not contribute; their
    /// width is only known once their process exists.
    pub fn named_width(&self) -> usize {
        self.named_width
    }

    pub fn into_jobs(self) -> Vec<JobDescriptor> {
        self.jobs
    }
}

impl FromIterator<JobDescriptor> for JobSet {
    fn from_iter<I: IntoIterator<Item = JobDescriptor>>(iter: I) -> Self {
        let mut builder = JobSetBuilder::new();
        for job in iter {
            builder.push(job);
        }
        builder.build()
    }
}

/// Accumulates descriptors one at a time as the command file is read.
///
/// Duplicate names are allowed; both jobs are run and reported under the
/// same label.
#[derive(Debug, Default)]
pub struct JobSetBuilder {
    jobs: Vec<JobDescriptor>,
    named_width: usize,
}

impl JobSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: JobDescriptor) -> &mut Self {
        self.named_width = self.named_width.max(job.name_width());
        self.jobs.push(job);
        self
    }

    pub fn build(self) -> JobSet {
        JobSet {
            jobs: self.jobs,
            named_width: self.named_width,
        }
    }
}
