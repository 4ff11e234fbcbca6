// lines.rs - Line-oriented artifact helpers
// Purpose: Every artifact between stages is a newline-separated text file

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::errors::{PipelineError, Result};

/// Load trimmed, non-empty lines. A missing file reads as empty.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(parse_output(&String::from_utf8_lossy(&bytes)))
}

/// Number of usable lines in a file (0 when absent)
pub fn count_lines(path: &Path) -> Result<usize> {
    Ok(read_lines(path)?.len())
}

/// Split captured tool output into trimmed, non-empty lines
pub fn parse_output(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Overwrite `path` with one line per item
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    persist(path, lines, false)
}

/// Append one line per item to `path`, creating it if needed
pub fn append_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    persist(path, lines, true)
}

fn persist<I, S>(path: &Path, lines: I, append: bool) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| PipelineError::io(path, e))?;

    let mut buf = String::new();
    for line in lines {
        buf.push_str(line.as_ref());
        buf.push('\n');
    }

    file.write_all(buf.as_bytes())
        .map_err(|e| PipelineError::io(path, e))
}

/// Create the parent directory of `path` if it has one
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Remove `path` if present
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

/// Drop later duplicates, keeping each item at its first position
pub fn unique_preserve_order<I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

/// `sort -u`: lexicographic order, set semantics
pub fn sort_unique<I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    lines
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
