#![allow(dead_code)]

pub use runner_test_utils::*;

/// A printed job line split into `(name, time, rest)`.
///
/// Job lines look like `<padded name>:<padded time>-<rest>`; the time
/// itself contains colons, so split on the first `:` and the first `-`
/// after it.
pub fn split_job_line(line: &str) -> Option<(String, String, String)> {
    let (name, tail) = line.split_once(':')?;
    let (time, rest) = tail.split_once('-')?;
    Some((
        name.trim().to_string(),
        time.trim().to_string(),
        rest.to_string(),
    ))
}

/// All lines printed for the job called `name`, in print order.
pub fn lines_for(lines: &[String], name: &str) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| split_job_line(l))
        .filter(|(n, _, _)| n == name)
        .map(|(_, _, rest)| rest)
        .collect()
}
