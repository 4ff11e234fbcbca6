// pipeline.rs - Pipeline driver
// Purpose: discovery → history (per mode) → merge → refine → knoxnl, strictly
//          in sequence, aborting on the first fatal tool failure

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use colored::*;

use crate::batching::Sleeper;
use crate::config::PipelineConfig;
use crate::discovery::discover_live_hosts;
use crate::errors::Result;
use crate::history::HistorySource;
use crate::merge::merge_histories;
use crate::metrics::RunMetrics;
use crate::progress::ProgressTracker;
use crate::refine::refine_candidates;
use crate::runner::ToolRunner;
use crate::scan::run_xss_scan;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub metrics: RunMetrics,
    /// Artifacts written, in stage order
    pub files: Vec<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
    runner: Arc<dyn ToolRunner>,
    sleeper: Arc<dyn Sleeper>,
    progress: ProgressTracker,
    run_id: String,
    /// Percentage of the stage that last failed
    failed_at: Mutex<f32>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, runner: Arc<dyn ToolRunner>, sleeper: Arc<dyn Sleeper>) -> Self {
        let run_id = uuid::Uuid::new_v4().to_string();
        let progress = ProgressTracker::new(
            run_id.clone(),
            config.domain.clone(),
            config.output_dir.clone(),
        );

        Self {
            config,
            runner,
            sleeper,
            progress,
            run_id,
            failed_at: Mutex::new(0.0),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut metrics = RunMetrics::new(
            self.run_id.clone(),
            self.config.domain.clone(),
            self.config.mode,
        );
        let mut files = Vec::new();

        self.progress.run_started();
        let outcome = self.run_stages(&mut metrics, &mut files).await;
        metrics.finalize();
        self.save_metrics(&metrics);

        match outcome {
            Ok(()) => {
                self.progress.run_completed();
                Ok(RunReport { metrics, files })
            }
            Err(e) => {
                let progress = self.failed_at.lock().map(|p| *p).unwrap_or(0.0);
                self.progress.run_failed(&e.to_string(), progress);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, metrics: &mut RunMetrics, files: &mut Vec<PathBuf>) -> Result<()> {
        let cfg = &self.config;
        let artifacts = &cfg.artifacts;
        let runner = self.runner.as_ref();
        let sleeper = self.sleeper.as_ref();

        // ── Discovery ──
        stage_start("subfinder", &format!("discovering subdomains for {}", cfg.domain));
        self.progress.tool_started("subfinder", 0.0);
        let discovery = self.track(
            "subfinder",
            20.0,
            discover_live_hosts(runner, sleeper, &cfg.domain, &artifacts.subdomains, cfg.host_batches).await,
        )?;
        files.push(artifacts.subdomains.clone());
        metrics.subdomains_discovered = discovery.discovered;
        metrics.subdomains_live = discovery.live;
        self.progress.tool_completed("subfinder", 20.0);
        self.progress.data_found("live subdomains", discovery.live, 20.0);
        stage_done(&format!(
            "subfinder: {} discovered; httpx live: {}",
            discovery.discovered, discovery.live
        ));
        if discovery.live == 0 {
            warn("no live subdomains; history sources will receive empty input");
        }

        // ── History ──
        let sources = HistorySource::for_mode(cfg.mode);
        let step = 30.0 / sources.len() as f32;
        let mut generated = Vec::new();
        for (i, source) in sources.iter().enumerate() {
            let pct = 20.0 + step * (i + 1) as f32;
            let out = source.output_path(artifacts);

            stage_start(source.tool(), &format!("{} ...", source.activity()));
            self.progress.tool_started(source.tool(), pct - step);
            let count = self.track(
                source.tool(),
                pct,
                source
                    .collect(runner, sleeper, &artifacts.subdomains, out, cfg.host_batches)
                    .await,
            )?;
            self.progress.tool_completed(source.tool(), pct);
            self.progress.data_found(&format!("{} URLs", source.tool()), count, pct);
            metrics.add_source(source.tool(), count);
            stage_done(&format!("{}: {} URLs", source.tool(), count));

            generated.push(out.clone());
            files.push(out.clone());
        }

        // ── Merge ──
        let merged_name = artifacts.candidates.display().to_string();
        stage_start("merge", &format!("combining history into {} ...", merged_name));
        let summary = self.track("merge", 60.0, merge_histories(&generated, &artifacts.candidates))?;
        metrics.history_total = summary.total;
        metrics.merged_unique = summary.unique;
        self.progress.data_found("unique URLs", summary.unique, 60.0);
        stage_done(&format!("merge: {} total → {} unique", summary.total, summary.unique));

        // ── Refine ──
        stage_start("filter", "gf → '=' & ext-filter → uro → httpx ...");
        self.progress.tool_started("gf", 60.0);
        let counts = self.track(
            "filter",
            85.0,
            refine_candidates(
                runner,
                sleeper,
                &artifacts.candidates,
                &artifacts.candidates,
                cfg.url_batches,
            )
            .await,
        )?;
        files.push(artifacts.candidates.clone());
        metrics.pattern_matched = counts.matched;
        metrics.structurally_filtered = counts.filtered;
        metrics.normalized = counts.normalized;
        metrics.live_candidates = counts.live;
        self.progress.tool_completed("httpx", 85.0);
        self.progress.data_found("live candidates", counts.live, 85.0);
        stage_done(&format!(
            "filter: gf={} → '='+ext={} → uro={} → httpx live={}",
            counts.matched, counts.filtered, counts.normalized, counts.live
        ));
        if counts.live == 0 {
            warn("no live candidate URLs; knoxnl will run on an empty list");
        }

        // ── Scan ──
        stage_start("knoxnl", "scanning for XSS ...");
        self.progress.tool_started("knoxnl", 85.0);
        let report_lines = self.track(
            "knoxnl",
            100.0,
            run_xss_scan(runner, &artifacts.candidates, &artifacts.scan_report).await,
        )?;
        files.push(artifacts.scan_report.clone());
        metrics.scan_report_lines = report_lines;
        self.progress.tool_completed("knoxnl", 100.0);
        stage_done(&format!(
            "knoxnl: results={} lines → {}",
            report_lines,
            artifacts.scan_report.display()
        ));

        Ok(())
    }

    /// Record a failure event before handing the error back
    fn track<T>(&self, stage: &str, progress: f32, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            let tool = e.tool().unwrap_or(stage);
            self.progress.tool_failed(tool, &e.to_string(), progress);
            if let Ok(mut failed_at) = self.failed_at.lock() {
                *failed_at = progress;
            }
        }
        result
    }

    fn save_metrics(&self, metrics: &RunMetrics) {
        if let Err(e) = metrics.save_to_file(&self.config.artifacts.metrics) {
            warn(&format!("could not save metrics: {}", e));
        }
    }
}

fn stage_start(tool: &str, activity: &str) {
    println!("{}", format!(">>> {}: {}", tool, activity).cyan());
}

fn stage_done(message: &str) {
    println!("{}", format!("[✓] {}", message).green());
}

fn warn(message: &str) {
    println!("{}", format!("[!] {}", message).yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batching::testing::RecordingSleeper;
    use crate::config::Mode;
    use crate::errors::PipelineError;
    use crate::lines::{read_lines, write_lines};
    use crate::progress::{EventType, PROGRESS_FILE};
    use crate::runner::testing::{arg_after, stdin_lines, ScriptedRunner};
    use crate::runner::{Invocation, ToolOutput};
    use std::path::Path;

    fn write_to_flag(inv: &Invocation, flag: &str, lines: &[String]) -> ToolOutput {
        let out = arg_after(inv, flag).unwrap();
        write_lines(Path::new(out), lines).unwrap();
        ToolOutput::ok("")
    }

    fn echo(inv: &Invocation) -> ToolOutput {
        ToolOutput::ok(stdin_lines(inv).join("\n"))
    }

    /// Every tool answers with something plausible
    fn healthy_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .on("subfinder", |_| ToolOutput::ok("www.example.com\napi.example.com\n"))
            .on("httpx", |inv| {
                let out: Vec<String> = stdin_lines(inv)
                    .into_iter()
                    .map(|l| if l.starts_with("http") { l } else { format!("https://{}", l) })
                    .collect();
                ToolOutput::ok(out.join("\n"))
            })
            .on("waymore", |inv| {
                write_to_flag(
                    inv,
                    "-oU",
                    &[
                        "https://www.example.com/search?q=a".to_string(),
                        "https://www.example.com/logo.png".to_string(),
                    ],
                )
            })
            .on("katana", |inv| {
                write_to_flag(
                    inv,
                    "-o",
                    &[
                        "https://api.example.com/v1/items?id=3".to_string(),
                        "https://www.example.com/search?q=a".to_string(),
                    ],
                )
            })
            .on("gau", |inv| {
                write_to_flag(inv, "-o", &["https://www.example.com/app.js?v=2".to_string()])
            })
            .on("gf", echo)
            .on("uro", echo)
            .on("knoxnl", |inv| {
                write_to_flag(inv, "-o", &["[ NONE ] - https://www.example.com/search?q=a".to_string()])
            })
    }

    fn pipeline(dir: &Path, mode: Mode, runner: Arc<ScriptedRunner>) -> Pipeline {
        let config = PipelineConfig::new("example.com", mode, 0, dir);
        Pipeline::new(config, runner, Arc::new(RecordingSleeper::default()))
    }

    #[tokio::test]
    async fn test_full_run_in_all_mode() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner());
        let pipeline = pipeline(dir.path(), Mode::All, runner.clone());

        let report = pipeline.run().await.unwrap();

        assert_eq!(
            runner.programs(),
            vec!["subfinder", "httpx", "waymore", "katana", "gau", "gf", "uro", "httpx", "knoxnl"]
        );

        let names: Vec<String> = report
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["subs.txt", "xss-waymore.txt", "xss-katana.txt", "xss-gau.txt", "xss.txt", "xssoutput.txt"]
        );
        assert!(report.files.iter().all(|p| p.exists()));

        let m = &report.metrics;
        assert_eq!((m.subdomains_discovered, m.subdomains_live), (2, 2));
        assert_eq!(m.history_total, 5);
        assert_eq!(m.merged_unique, 4);
        assert_eq!(m.pattern_matched, 4);
        assert_eq!(m.structurally_filtered, 2);
        assert_eq!(m.live_candidates, 2);
        assert_eq!(m.scan_report_lines, 1);

        assert_eq!(
            read_lines(&dir.path().join("xss.txt")).unwrap(),
            vec![
                "https://api.example.com/v1/items?id=3",
                "https://www.example.com/search?q=a",
            ]
        );
        assert!(dir.path().join("scan_metrics.json").exists());

        let events = ProgressTracker::read_events_from_file(&dir.path().join(PROGRESS_FILE));
        assert_eq!(events.first().unwrap().event_type, EventType::RunStarted);
        assert_eq!(events.last().unwrap().event_type, EventType::RunCompleted);
    }

    #[tokio::test]
    async fn test_waymore_mode_skips_other_sources() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner());
        let report = pipeline(dir.path(), Mode::Waymore, runner.clone())
            .run()
            .await
            .unwrap();

        let programs = runner.programs();
        assert!(programs.contains(&"waymore".to_string()));
        assert!(!programs.contains(&"katana".to_string()));
        assert!(!programs.contains(&"gau".to_string()));
        assert_eq!(report.metrics.history_sources.len(), 1);
        assert!(!dir.path().join("xss-katana.txt").exists());
    }

    #[tokio::test]
    async fn test_prober_failure_stops_before_history() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            healthy_runner().on("httpx", |_| ToolOutput::failed(1, "connection refused")),
        );

        let err = pipeline(dir.path(), Mode::All, runner.clone())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ToolFailed { ref tool, .. } if tool == "httpx"));
        assert_eq!(runner.programs(), vec!["subfinder", "httpx"]);

        let events = ProgressTracker::read_events_from_file(&dir.path().join(PROGRESS_FILE));
        assert!(events.iter().any(|e| matches!(
            &e.event_type,
            EventType::ToolFailed { tool_name, .. } if tool_name == "httpx"
        )));
        assert!(matches!(events.last().unwrap().event_type, EventType::RunFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_failure_reports_stage_progress() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner().on("knoxnl", |_| ToolOutput::failed(2, "")));

        pipeline(dir.path(), Mode::Waymore, runner).run().await.unwrap_err();

        let events = ProgressTracker::read_events_from_file(&dir.path().join(PROGRESS_FILE));
        let failed = events.last().unwrap();
        assert!(matches!(failed.event_type, EventType::RunFailed { .. }));
        assert_eq!(failed.progress_percentage, 100.0);

        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner().on("httpx", |_| ToolOutput::failed(1, "")));

        pipeline(dir.path(), Mode::Waymore, runner).run().await.unwrap_err();

        let events = ProgressTracker::read_events_from_file(&dir.path().join(PROGRESS_FILE));
        assert_eq!(events.last().unwrap().progress_percentage, 20.0);
    }

    #[tokio::test]
    async fn test_scanner_failure_keeps_earlier_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner().on("knoxnl", |_| ToolOutput::failed(2, "")));

        let err = pipeline(dir.path(), Mode::WaymoreKatana, runner).run().await.unwrap_err();

        assert_eq!(err.tool(), Some("knoxnl"));
        assert!(dir.path().join("subs.txt").exists());
        assert!(dir.path().join("xss-waymore.txt").exists());
        assert!(dir.path().join("xss.txt").exists());
    }

    #[tokio::test]
    async fn test_no_subdomains_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(healthy_runner().on("subfinder", |_| ToolOutput::ok("")));

        let report = pipeline(dir.path(), Mode::Waymore, runner.clone()).run().await.unwrap();

        assert_eq!(report.metrics.subdomains_live, 0);
        // waymore still runs against the empty subdomain list
        assert!(runner.programs().contains(&"waymore".to_string()));
    }
}
