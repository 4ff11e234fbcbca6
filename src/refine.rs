// refine.rs - Candidate refinement
// Purpose: sort -u | gf xss | grep '=' | egrep -iv <static ext> | uro | httpx -silent

use std::path::Path;

use crate::batching::{stdin_payload, BatchPolicy, Sleeper};
use crate::errors::Result;
use crate::filter::retain_candidates;
use crate::lines::{parse_output, read_lines, sort_unique, unique_preserve_order, write_lines};
use crate::runner::{Invocation, ToolRunner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineCounts {
    /// Lines emitted by `gf xss`
    pub matched: usize,
    /// Survivors of the `=` and extension filter
    pub filtered: usize,
    /// Distinct URLs after uro
    pub normalized: usize,
    /// Distinct URLs httpx still reaches
    pub live: usize,
}

/// Reduce `merged_in` to live, parameterised XSS candidates in `final_out`.
/// Both paths may name the same file.
pub async fn refine_candidates(
    runner: &dyn ToolRunner,
    sleeper: &dyn Sleeper,
    merged_in: &Path,
    final_out: &Path,
    policy: BatchPolicy,
) -> Result<RefineCounts> {
    let mut counts = RefineCounts::default();

    let lines = read_lines(merged_in)?;
    if lines.is_empty() {
        write_lines(final_out, Vec::<String>::new())?;
        return Ok(counts);
    }

    let matched = match_xss_patterns(runner, sort_unique(lines)).await?;
    counts.matched = matched.len();

    let filtered = retain_candidates(&matched);
    counts.filtered = filtered.len();
    if filtered.is_empty() {
        write_lines(final_out, Vec::<String>::new())?;
        return Ok(counts);
    }

    let normalized = run_batched(
        runner,
        sleeper,
        || Invocation::new("uro", Vec::<String>::new()),
        "uro",
        "normalizing URLs",
        &filtered,
        policy,
    )
    .await?;
    counts.normalized = normalized.len();
    if normalized.is_empty() {
        write_lines(final_out, Vec::<String>::new())?;
        return Ok(counts);
    }

    let live = run_batched(
        runner,
        sleeper,
        || Invocation::new("httpx", ["-silent"]),
        "httpx",
        "probing URLs",
        &normalized,
        policy,
    )
    .await?;
    counts.live = live.len();

    write_lines(final_out, &live)?;
    Ok(counts)
}

async fn match_xss_patterns(runner: &dyn ToolRunner, urls: Vec<String>) -> Result<Vec<String>> {
    let gf = Invocation::new("gf", ["xss"]).stdin(stdin_payload(&urls));
    let output = runner
        .run(&gf)
        .await?
        .ensure_success("gf", Some("matching xss patterns"))?;
    Ok(parse_output(&output.stdout))
}

/// Pipe `items` through a tool batch by batch, concatenating stdout and
/// de-duplicating across batches
async fn run_batched<F>(
    runner: &dyn ToolRunner,
    sleeper: &dyn Sleeper,
    invocation: F,
    tool: &str,
    context: &str,
    items: &[String],
    policy: BatchPolicy,
) -> Result<Vec<String>>
where
    F: Fn() -> Invocation,
{
    let batches = policy.split(items);
    let total = batches.len();
    let mut collected = Vec::new();

    for (idx, batch) in batches.iter().enumerate() {
        let output = runner
            .run(&invocation().stdin(stdin_payload(batch)))
            .await?
            .ensure_success(tool, Some(context))?;
        collected.extend(parse_output(&output.stdout));

        policy.pause_after(idx, total, sleeper).await;
    }

    Ok(unique_preserve_order(collected))
}
