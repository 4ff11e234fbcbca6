use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Mode;

/// Counts gathered across one pipeline run, saved as scan_metrics.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: String,
    pub target: String,
    pub mode: Mode,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,

    // Discovery
    pub subdomains_discovered: usize,
    pub subdomains_live: usize,

    // History collection, one entry per source that ran
    pub history_sources: Vec<SourceCount>,
    pub history_total: usize,
    pub merged_unique: usize,

    // Refinement
    pub pattern_matched: usize,
    pub structurally_filtered: usize,
    pub normalized: usize,
    pub live_candidates: usize,

    /// Line count of the scanner's report, not a findings count
    pub scan_report_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub urls: usize,
}

impl RunMetrics {
    pub fn new(run_id: String, target: String, mode: Mode) -> Self {
        Self {
            run_id,
            target,
            mode,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: 0.0,
            subdomains_discovered: 0,
            subdomains_live: 0,
            history_sources: Vec::new(),
            history_total: 0,
            merged_unique: 0,
            pattern_matched: 0,
            structurally_filtered: 0,
            normalized: 0,
            live_candidates: 0,
            scan_report_lines: 0,
        }
    }

    pub fn add_source(&mut self, source: &str, urls: usize) {
        self.history_sources.push(SourceCount {
            source: source.to_string(),
            urls,
        });
    }

    pub fn finalize(&mut self) {
        let end = Utc::now();
        self.end_time = Some(end);
        self.duration_seconds = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn summary(&self) -> String {
        let sources = self
            .history_sources
            .iter()
            .map(|s| format!("{}={}", s.source, s.urls))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Run ID: {}\nTarget: {}\nMode: {}\nDuration: {:.2}s\n\
             - Subdomains: {} discovered, {} live\n\
             - History URLs: {} ({})\n\
             - Merged unique: {}\n\
             - Candidates: gf={} → filtered={} → uro={} → live={}\n\
             - Scanner report: {} lines\n",
            self.run_id,
            self.target,
            self.mode,
            self.duration_seconds,
            self.subdomains_discovered,
            self.subdomains_live,
            self.history_total,
            sources,
            self.merged_unique,
            self.pattern_matched,
            self.structurally_filtered,
            self.normalized,
            self.live_candidates,
            self.scan_report_lines
        )
    }
}
