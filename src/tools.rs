// tools.rs - Required tool catalogue and PATH preflight
// Purpose: Refuse to start a run when any external program for the selected
//          mode is not installed

use std::env;
use std::path::{Path, PathBuf};

use crate::config::Mode;
use crate::errors::{PipelineError, Result};

/// Tool definition with installation info
pub struct ToolInfo {
    pub binary: &'static str,
    pub description: &'static str,
    pub install_cmd: &'static str,
}

const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        binary: "subfinder",
        description: "Passive subdomain discovery",
        install_cmd: "go install -v github.com/projectdiscovery/subfinder/v2/cmd/subfinder@latest",
    },
    ToolInfo {
        binary: "httpx",
        description: "HTTP liveness prober",
        install_cmd: "go install -v github.com/projectdiscovery/httpx/cmd/httpx@latest",
    },
    ToolInfo {
        binary: "waymore",
        description: "Archived URLs from Wayback, Common Crawl and others",
        install_cmd: "pip install git+https://github.com/xnl-h4ck3r/waymore.git",
    },
    ToolInfo {
        binary: "katana",
        description: "Headless crawler",
        install_cmd: "go install github.com/projectdiscovery/katana/cmd/katana@latest",
    },
    ToolInfo {
        binary: "gau",
        description: "Known URLs from AlienVault, Wayback, Common Crawl, URLScan",
        install_cmd: "go install github.com/lc/gau/v2/cmd/gau@latest",
    },
    ToolInfo {
        binary: "gf",
        description: "Pattern matcher (needs the xss pattern installed)",
        install_cmd: "go install github.com/tomnomnom/gf@latest",
    },
    ToolInfo {
        binary: "uro",
        description: "URL de-duplication and canonicalization",
        install_cmd: "pipx install uro",
    },
    ToolInfo {
        binary: "knoxnl",
        description: "XSS scanning through the knoxss.me API",
        install_cmd: "pip install git+https://github.com/xnl-h4ck3r/knoxnl.git",
    },
];

pub fn tool_info(binary: &str) -> Option<&'static ToolInfo> {
    TOOLS.iter().find(|t| t.binary == binary)
}

/// Executables the given mode will invoke, in pipeline order
pub fn required_tools(mode: Mode) -> Vec<&'static str> {
    let mut required = vec!["subfinder", "httpx", "gf", "uro", "knoxnl"];
    required.push("waymore");
    if matches!(mode, Mode::WaymoreKatana | Mode::All) {
        required.push("katana");
    }
    if mode == Mode::All {
        required.push("gau");
    }
    required
}

#[derive(Debug, Default)]
pub struct ToolCheck {
    pub found: Vec<(String, PathBuf)>,
    pub missing: Vec<String>,
}

impl ToolCheck {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Resolve every name on the current PATH
pub fn check_tools(names: &[&str]) -> ToolCheck {
    let path = env::var_os("PATH").unwrap_or_default();
    let dirs: Vec<PathBuf> = env::split_paths(&path).collect();
    check_tools_in(names, &dirs)
}

pub fn check_tools_in(names: &[&str], dirs: &[PathBuf]) -> ToolCheck {
    let mut check = ToolCheck::default();
    for name in names {
        match find_in_dirs(name, dirs) {
            Some(path) => check.found.push((name.to_string(), path)),
            None => check.missing.push(name.to_string()),
        }
    }
    check
}

/// Fail with the full list of missing names when `mode` cannot run
pub fn preflight(mode: Mode) -> Result<ToolCheck> {
    into_preflight(check_tools(&required_tools(mode)))
}

pub fn preflight_in(mode: Mode, dirs: &[PathBuf]) -> Result<ToolCheck> {
    into_preflight(check_tools_in(&required_tools(mode), dirs))
}

fn into_preflight(check: ToolCheck) -> Result<ToolCheck> {
    if check.is_ok() {
        Ok(check)
    } else {
        Err(PipelineError::MissingTools(check.missing))
    }
}

fn find_in_dirs(binary: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
