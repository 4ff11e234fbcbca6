// errors.rs - Error taxonomy for the crawlexsses pipeline
// Purpose: Distinguish preflight failures, external tool failures and I/O errors

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more required executables could not be resolved on PATH
    #[error("Missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    /// An external tool exited with a non-zero status
    #[error("{tool} failed{}{}", context_suffix(.context), code_suffix(.code))]
    ToolFailed {
        tool: String,
        context: Option<String>,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool could not be started at all
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the external tool behind this error, if any
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { tool, .. } | Self::Spawn { tool, .. } => Some(tool),
            _ => None,
        }
    }
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" while {}", ctx),
        None => String::new(),
    }
}

fn code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit status {})", code),
        None => " (terminated by signal)".to_string(),
    }
}
