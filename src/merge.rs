// merge.rs - History merge
// Purpose: Fold every history URL list into xss.txt, first occurrence wins

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::lines::{read_lines, unique_preserve_order, write_lines};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Lines across all inputs before de-duplication
    pub total: usize,
    pub unique: usize,
}

/// Concatenate `inputs` in order and keep the first occurrence of each URL.
/// Absent inputs contribute nothing.
pub fn merge_histories(inputs: &[PathBuf], merged_out: &Path) -> Result<MergeSummary> {
    let mut all_lines = Vec::new();
    for path in inputs {
        all_lines.extend(read_lines(path)?);
    }

    let total = all_lines.len();
    let merged = unique_preserve_order(all_lines);
    write_lines(merged_out, &merged)?;

    Ok(MergeSummary {
        total,
        unique: merged.len(),
    })
}
