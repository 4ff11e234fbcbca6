// scan.rs - knoxnl invocation
// Purpose: Hand the final candidates to knoxnl (GET and POST) and report the
//          size of its output file

use std::path::Path;

use crate::errors::Result;
use crate::lines::count_lines;
use crate::runner::{Invocation, ToolRunner};

pub fn knoxnl_invocation(input_file: &Path, report_file: &Path) -> Invocation {
    Invocation::new(
        "knoxnl",
        [
            "-i".to_string(),
            input_file.to_string_lossy().into_owned(),
            "-X".to_string(),
            "BOTH".to_string(),
            "-s".to_string(),
            "-o".to_string(),
            report_file.to_string_lossy().into_owned(),
        ],
    )
}

/// Returns the line count of the report; knoxnl owns its format, so this is
/// only a coarse signal that something was produced.
pub async fn run_xss_scan(runner: &dyn ToolRunner, input_file: &Path, report_file: &Path) -> Result<usize> {
    runner
        .run(&knoxnl_invocation(input_file, report_file))
        .await?
        .ensure_success("knoxnl", Some("scanning for XSS"))?;
    count_lines(report_file)
}
