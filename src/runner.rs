// runner.rs - External tool execution
// Purpose: Uniform interface for spawning recon tools, feeding stdin and
//          capturing or redirecting stdout

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use colored::*;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::errors::{PipelineError, Result};
use crate::lines::ensure_parent;

/// Where a child's stdout goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StdoutTarget {
    Capture,
    File { path: PathBuf, append: bool },
}

/// One external command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: StdoutTarget,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            stdout: StdoutTarget::Capture,
        }
    }

    pub fn stdin(mut self, input: String) -> Self {
        self.stdin = Some(input);
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>, append: bool) -> Self {
        self.stdout = StdoutTarget::File {
            path: path.into(),
            append,
        };
        self
    }

    /// Shell-like rendering for verbose logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; None when the child was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a fatal stage error
    pub fn ensure_success(self, tool: &str, context: Option<&str>) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(PipelineError::ToolFailed {
            tool: tool.to_string(),
            context: context.map(str::to_string),
            code: self.code,
            stderr: self.stderr,
        })
    }
}

/// Capability to run an external program. Non-zero exit is not an error here;
/// callers decide whether it is fatal.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Spawns real child processes
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        if self.verbose {
            eprintln!("{}", format!("[cmd] {}", invocation.command_line()).dimmed());
        }

        let stdout = match &invocation.stdout {
            StdoutTarget::Capture => Stdio::piped(),
            StdoutTarget::File { path, append } => {
                ensure_parent(path)?;
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(*append)
                    .truncate(!*append)
                    .open(path)
                    .map_err(|e| PipelineError::io(path, e))?;
                Stdio::from(file)
            }
        };

        let stdin = if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                tool: invocation.program.clone(),
                source,
            })?;

        // Feed stdin from a separate task so a chatty child cannot deadlock us
        let feeder = match (invocation.stdin.clone(), child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(tokio::spawn(async move {
                let _ = pipe.write_all(input.as_bytes()).await;
                let _ = pipe.shutdown().await;
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| PipelineError::Spawn {
                tool: invocation.program.clone(),
                source,
            })?;

        if let Some(feeder) = feeder {
            let _ = feeder.await;
        }

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if self.verbose && !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }

        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_rendering() {
        let inv = Invocation::new("httpx", ["-silent"]).stdin("a\n".to_string());
        assert_eq!(inv.command_line(), "httpx -silent");
        assert_eq!(inv.stdout, StdoutTarget::Capture);
    }

    #[test]
    fn test_ensure_success() {
        assert!(ToolOutput::ok("x").ensure_success("gf", None).is_ok());

        let err = ToolOutput::failed(1, "boom")
            .ensure_success("gf", Some("matching xss patterns"))
            .unwrap_err();
        match err {
            PipelineError::ToolFailed { tool, code, stderr, .. } => {
                assert_eq!(tool, "gf");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_pipes_stdin_and_captures_stdout() {
        let runner = ProcessRunner::new(false);
        let inv = Invocation::new("cat", Vec::<String>::new()).stdin("one\ntwo\n".to_string());
        let out = runner.run(&inv).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "one\ntwo\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_redirects_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let runner = ProcessRunner::new(false);

        let first = Invocation::new("cat", Vec::<String>::new())
            .stdin("a\n".to_string())
            .stdout_to(&path, false);
        runner.run(&first).await.unwrap();

        let second = Invocation::new("cat", Vec::<String>::new())
            .stdin("b\n".to_string())
            .stdout_to(&path, true);
        runner.run(&second).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_nonzero_exit() {
        let runner = ProcessRunner::new(false);
        let out = runner
            .run(&Invocation::new("sh", ["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_an_error() {
        let runner = ProcessRunner::new(false);
        let err = runner
            .run(&Invocation::new("definitely-not-a-real-tool-xyz", Vec::<String>::new()))
            .await
            .unwrap_err();
        assert_eq!(err.tool(), Some("definitely-not-a-real-tool-xyz"));
    }
}
