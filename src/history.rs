// history.rs - Historical and crawled URL collection
// Purpose: waymore (archives), katana (headless crawl) and gau (known URLs),
//          each reading subs.txt and writing its own URL list

use std::path::{Path, PathBuf};

use crate::batching::{stdin_payload, BatchPolicy, Sleeper};
use crate::config::{ArtifactPaths, Mode};
use crate::errors::Result;
use crate::lines::{count_lines, read_lines, remove_if_exists, write_lines};
use crate::runner::{Invocation, ToolRunner};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistorySource {
    Waymore,
    Katana,
    Gau,
}

impl HistorySource {
    /// Sources enabled by `mode`, in run order
    pub fn for_mode(mode: Mode) -> Vec<HistorySource> {
        match mode {
            Mode::Waymore => vec![HistorySource::Waymore],
            Mode::WaymoreKatana => vec![HistorySource::Waymore, HistorySource::Katana],
            Mode::All => vec![
                HistorySource::Waymore,
                HistorySource::Katana,
                HistorySource::Gau,
            ],
        }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            HistorySource::Waymore => "waymore",
            HistorySource::Katana => "katana",
            HistorySource::Gau => "gau",
        }
    }

    /// Progress line shown before the stage runs
    pub fn activity(&self) -> &'static str {
        match self {
            HistorySource::Waymore => "collecting historical URLs",
            HistorySource::Katana => "crawling for URLs",
            HistorySource::Gau => "fetching known URLs",
        }
    }

    pub fn output_path<'a>(&self, artifacts: &'a ArtifactPaths) -> &'a PathBuf {
        match self {
            HistorySource::Waymore => &artifacts.waymore,
            HistorySource::Katana => &artifacts.katana,
            HistorySource::Gau => &artifacts.gau,
        }
    }

    /// Run this source against `subs_file`, returning the URL count in `out_file`
    pub async fn collect(
        &self,
        runner: &dyn ToolRunner,
        sleeper: &dyn Sleeper,
        subs_file: &Path,
        out_file: &Path,
        policy: BatchPolicy,
    ) -> Result<usize> {
        match self {
            HistorySource::Waymore => run_waymore(runner, subs_file, out_file).await,
            HistorySource::Katana => run_katana(runner, subs_file, out_file).await,
            HistorySource::Gau => run_gau(runner, sleeper, subs_file, out_file, policy).await,
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn waymore_invocation(subs_file: &Path, out_file: &Path) -> Invocation {
    Invocation::new(
        "waymore",
        [
            "-i".to_string(),
            path_arg(subs_file),
            "-mode".to_string(),
            "U".to_string(),
            "-oU".to_string(),
            path_arg(out_file),
        ],
    )
}

pub fn katana_invocation(subs_file: &Path, out_file: &Path) -> Invocation {
    Invocation::new(
        "katana",
        [
            "-list".to_string(),
            path_arg(subs_file),
            "-headless".to_string(),
            "-jc".to_string(),
            "-d".to_string(),
            "5".to_string(),
            "-o".to_string(),
            path_arg(out_file),
        ],
    )
}

pub fn gau_invocation(out_file: &Path) -> Invocation {
    Invocation::new(
        "gau",
        ["--subs".to_string(), "-o".to_string(), path_arg(out_file)],
    )
}

/// Archive URLs for every live host
pub async fn run_waymore(runner: &dyn ToolRunner, subs_file: &Path, out_file: &Path) -> Result<usize> {
    runner
        .run(&waymore_invocation(subs_file, out_file))
        .await?
        .ensure_success("waymore", None)?;
    count_lines(out_file)
}

/// Headless crawl, JS parsing enabled, depth 5
pub async fn run_katana(runner: &dyn ToolRunner, subs_file: &Path, out_file: &Path) -> Result<usize> {
    runner
        .run(&katana_invocation(subs_file, out_file))
        .await?
        .ensure_success("katana", None)?;
    count_lines(out_file)
}

/// Known URLs, hosts piped over stdin in paced batches
pub async fn run_gau(
    runner: &dyn ToolRunner,
    sleeper: &dyn Sleeper,
    subs_file: &Path,
    out_file: &Path,
    policy: BatchPolicy,
) -> Result<usize> {
    let subs = read_lines(subs_file)?;
    if subs.is_empty() {
        write_lines(out_file, Vec::<String>::new())?;
        return Ok(0);
    }

    remove_if_exists(out_file)?;

    let batches = policy.split(&subs);
    let total = batches.len();
    for (idx, batch) in batches.iter().enumerate() {
        runner
            .run(&gau_invocation(out_file).stdin(stdin_payload(batch)))
            .await?
            .ensure_success("gau", None)?;

        policy.pause_after(idx, total, sleeper).await;
    }

    count_lines(out_file)
}
