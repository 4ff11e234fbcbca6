// main.rs - crawlexsses
// Purpose: Collect reflected-parameter XSS candidates for a domain by chaining
//          subfinder, httpx, waymore/katana/gau, gf, uro and knoxnl

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use crawlexsses::batching::TokioSleeper;
use crawlexsses::runner::ProcessRunner;
use crawlexsses::tools::{preflight, tool_info};
use crawlexsses::{Mode, Pipeline, PipelineConfig, PipelineError};

/// Crawl and collect potential XSS endpoints
#[derive(Parser, Debug)]
#[command(
    name = "crawlexsses",
    version,
    about = "Crawl and collect potential XSS endpoints by combining subfinder, httpx, \
             waymore/katana/gau, gf, uro, and knoxnl. All outputs end with .txt.",
    after_help = r#"
OUTPUT FILES (in --output-dir):

  subs.txt            Live subdomains (subfinder | httpx)
  xss-waymore.txt     waymore URLs
  xss-katana.txt      katana URLs          (waymore-katana, all)
  xss-gau.txt         gau URLs             (all)
  xss.txt             Final live XSS candidates
  xssoutput.txt       knoxnl results
  scan_metrics.json   Per-stage counts
  progress.jsonl      Stage events

REQUIRED TOOLS:

  subfinder, httpx, gf (with the xss pattern), uro, knoxnl, waymore
  plus katana for waymore-katana, and katana + gau for all
"#
)]
struct Args {
    /// Target domain (e.g., example.com)
    #[arg(short, long, value_name = "DOMAIN")]
    domain: String,

    /// History sources to use: waymore only, waymore+katana, or all (waymore+katana+gau)
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Simple IO rate limit (batch size) when streaming data into tools. 0 disables chunking
    #[arg(
        short,
        long = "rate-limit",
        value_name = "N",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    rate_limit: i64,

    /// Echo every external command and its stderr
    #[arg(short, long)]
    verbose: bool,

    /// Directory receiving every output file
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Skip the banner
    #[arg(long)]
    no_banner: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.no_banner {
        print_banner();
    }

    let domain = args.domain.trim();
    if domain.is_empty() {
        anyhow::bail!("--domain must not be empty");
    }

    match preflight(args.mode) {
        Ok(check) => {
            if args.verbose {
                for (name, path) in &check.found {
                    eprintln!("    {} {} → {}", "✓".green(), name.green(), path.display().to_string().dimmed());
                }
            }
        }
        Err(e) => {
            report_missing_tools(&e);
            std::process::exit(1);
        }
    }

    std::fs::create_dir_all(&args.output_dir).context(format!(
        "Failed to create output directory: {}",
        args.output_dir.display()
    ))?;

    let config = PipelineConfig::new(domain, args.mode, args.rate_limit, &args.output_dir);
    let pipeline = Pipeline::new(
        config,
        Arc::new(ProcessRunner::new(args.verbose)),
        Arc::new(TokioSleeper),
    );

    println!("{}", format!("[*] Target: {} (mode: {})", domain, args.mode).cyan());
    println!("{}", format!("[*] Run ID: {}", pipeline.run_id()).cyan());

    match pipeline.run().await {
        Ok(report) => {
            println!("{}", "[done] Files saved:".green().bold());
            for file in &report.files {
                println!(" - {}", file.display());
            }
            println!();
            print!("{}", report.metrics.summary().dimmed());
            Ok(())
        }
        Err(e) => {
            if let PipelineError::ToolFailed { stderr, .. } = &e {
                if !args.verbose && !stderr.trim().is_empty() {
                    eprintln!("{}", stderr.trim_end().dimmed());
                }
            }
            eprintln!("{}", format!("[✗] {}", e).red().bold());
            Err(e).context("pipeline aborted")
        }
    }
}

fn report_missing_tools(err: &PipelineError) {
    eprintln!("{}", err.to_string().red().bold());
    if let PipelineError::MissingTools(missing) = err {
        for name in missing {
            match tool_info(name) {
                Some(info) => {
                    eprintln!("{}", format!("  ✗ {} - {}", name, info.description).red());
                    eprintln!("{}", format!("    Install: {}", info.install_cmd).yellow());
                }
                None => eprintln!("{}", format!("  ✗ {}", name).red()),
            }
        }
    }
    eprintln!("Please install them and ensure they are in PATH.");
}

fn print_banner() {
    let banner = r#"
  ___ _ __ __ ___      _| | _____  _____ ___  ___  ___
 / __| '__/ _` \ \ /\ / / |/ _ \ \/ / __/ __|/ _ \/ __|
| (__| | | (_| |\ V  V /| |  __/>  <\__ \__ \  __/\__ \
 \___|_|  \__,_| \_/\_/ |_|\___/_/\_\___/___/\___||___/

          XSS discovery - find those hidden XSS gems
"#;
    println!("{}", banner.green().bold());
}
