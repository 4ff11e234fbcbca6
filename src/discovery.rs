// discovery.rs - Subdomain discovery and liveness probing
// Purpose: subfinder -d <domain> | httpx -silent > subs.txt, in paced batches

use std::path::Path;

use crate::batching::{stdin_payload, BatchPolicy, Sleeper};
use crate::errors::Result;
use crate::lines::{count_lines, parse_output, remove_if_exists, write_lines};
use crate::runner::{Invocation, ToolRunner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryCounts {
    pub discovered: usize,
    pub live: usize,
}

pub fn subfinder_invocation(domain: &str) -> Invocation {
    Invocation::new("subfinder", ["-d", domain, "-all", "-silent"])
}

pub fn httpx_invocation() -> Invocation {
    Invocation::new("httpx", ["-silent"])
}

/// Enumerate subdomains of `domain` and keep the live ones in `subs_out`
pub async fn discover_live_hosts(
    runner: &dyn ToolRunner,
    sleeper: &dyn Sleeper,
    domain: &str,
    subs_out: &Path,
    policy: BatchPolicy,
) -> Result<DiscoveryCounts> {
    let subfinder = runner
        .run(&subfinder_invocation(domain))
        .await?
        .ensure_success("subfinder", Some("discovering subdomains"))?;

    let subdomains = parse_output(&subfinder.stdout);
    if subdomains.is_empty() {
        write_lines(subs_out, Vec::<String>::new())?;
        return Ok(DiscoveryCounts::default());
    }

    remove_if_exists(subs_out)?;

    let batches = policy.split(&subdomains);
    let total = batches.len();
    for (idx, batch) in batches.iter().enumerate() {
        let probe = httpx_invocation()
            .stdin(stdin_payload(batch))
            .stdout_to(subs_out, idx != 0);

        runner
            .run(&probe)
            .await?
            .ensure_success("httpx", Some("probing subdomains"))?;

        policy.pause_after(idx, total, sleeper).await;
    }

    Ok(DiscoveryCounts {
        discovered: subdomains.len(),
        live: count_lines(subs_out)?,
    })
}
