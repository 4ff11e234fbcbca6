// config.rs - Run configuration
// Purpose: Mode selection, batching policies and every artifact path a run
//          reads or writes

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::batching::BatchPolicy;

/// Pause between subfinder→httpx and gau batches
pub const HOST_BATCH_DELAY: Duration = Duration::from_millis(100);
/// Pause between uro and httpx batches while refining URLs
pub const URL_BATCH_DELAY: Duration = Duration::from_millis(50);

/// Which history sources run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// waymore only
    Waymore,
    /// waymore + katana
    WaymoreKatana,
    /// waymore + katana + gau
    #[default]
    All,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Waymore => "waymore",
            Mode::WaymoreKatana => "waymore-katana",
            Mode::All => "all",
        };
        f.write_str(name)
    }
}

/// Files produced by a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub subdomains: PathBuf,
    pub waymore: PathBuf,
    pub katana: PathBuf,
    pub gau: PathBuf,
    /// Merged history, later overwritten with the final candidates
    pub candidates: PathBuf,
    pub scan_report: PathBuf,
    pub metrics: PathBuf,
}

impl ArtifactPaths {
    /// Default file names rooted at `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            subdomains: dir.join("subs.txt"),
            waymore: dir.join("xss-waymore.txt"),
            katana: dir.join("xss-katana.txt"),
            gau: dir.join("xss-gau.txt"),
            candidates: dir.join("xss.txt"),
            scan_report: dir.join("xssoutput.txt"),
            metrics: dir.join("scan_metrics.json"),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(Path::new(""))
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub domain: String,
    pub mode: Mode,
    /// Subdomain probing and gau batches
    pub host_batches: BatchPolicy,
    /// uro normalization and URL re-probe batches
    pub url_batches: BatchPolicy,
    pub output_dir: PathBuf,
    pub artifacts: ArtifactPaths,
}

impl PipelineConfig {
    /// `rate_limit` is the batch size; 0 or below streams everything at once
    pub fn new(domain: &str, mode: Mode, rate_limit: i64, output_dir: &Path) -> Self {
        let rate_limit = usize::try_from(rate_limit.max(0)).unwrap_or(usize::MAX);
        Self {
            domain: domain.trim().to_string(),
            mode,
            host_batches: BatchPolicy::new(rate_limit, HOST_BATCH_DELAY),
            url_batches: BatchPolicy::new(rate_limit, URL_BATCH_DELAY),
            output_dir: output_dir.to_path_buf(),
            artifacts: ArtifactPaths::in_dir(output_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_artifact_names() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.subdomains, PathBuf::from("subs.txt"));
        assert_eq!(paths.candidates, PathBuf::from("xss.txt"));
        assert_eq!(paths.scan_report, PathBuf::from("xssoutput.txt"));
    }

    #[test]
    fn test_config_roots_artifacts_in_output_dir() {
        let config = PipelineConfig::new(" example.com ", Mode::All, 25, Path::new("/tmp/run"));
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.artifacts.gau, PathBuf::from("/tmp/run/xss-gau.txt"));
        assert_eq!(config.host_batches.size, 25);
        assert_eq!(config.url_batches.delay, URL_BATCH_DELAY);
    }

    #[test]
    fn test_non_positive_rate_limit_disables_chunking() {
        for rate in [0, -1, -50] {
            let config = PipelineConfig::new("example.com", Mode::All, rate, Path::new("."));
            assert!(!config.host_batches.is_chunking(), "rate {}", rate);
            assert!(!config.url_batches.is_chunking(), "rate {}", rate);
            assert_eq!(config.host_batches.split(&["a", "b", "c"]).len(), 1);
        }
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::default(), Mode::All);
        assert_eq!(Mode::WaymoreKatana.to_string(), "waymore-katana");
        assert_eq!(
            Mode::from_str("waymore-katana", false).unwrap(),
            Mode::WaymoreKatana
        );
    }
}
