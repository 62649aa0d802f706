//! The single entry point through which external tools are executed.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::common::error::{ClipError, ClipResult};

/// Lines of the tool's error stream kept as diagnostics on failure.
const STDERR_TAIL_LINES: usize = 20;

/// One external binary execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in logs and errors (`/usr/bin/ffmpeg` -> `ffmpeg`).
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// The tool emitted an explicit `progress=end` marker.
    pub reached_end: bool,
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: ToolInvocation) -> ClipResult<ToolOutput>;
}

/// Runs tools as child processes on the tokio runtime, so a long transcode
/// only suspends the calling task.
pub struct ProcessInvoker {
    timeout: Duration,
}

impl ProcessInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for ProcessInvoker {
    async fn run(&self, invocation: ToolInvocation) -> ClipResult<ToolOutput> {
        let tool = invocation.tool_name();

        let program = which::which(&invocation.program).map_err(|_| {
            ClipError::tool(&tool, format!("{} not found in PATH", invocation.program), None)
        })?;

        debug!("Running {}: {}", tool, invocation.args.join(" "));

        let child = Command::new(&program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClipError::tool(&tool, format!("failed to launch: {}", e), None))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ClipError::tool(&tool, format!("failed while waiting: {}", e), None))?,
            Err(_) => {
                warn!("{} timed out after {}s, killing process", tool, self.timeout.as_secs());
                return Err(ClipError::tool(
                    &tool,
                    format!("timed out after {} seconds", self.timeout.as_secs()),
                    None,
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            };
            warn!("{} {}", tool, message);
            return Err(ClipError::tool(&tool, message, Some(stderr_tail(&stderr))));
        }

        Ok(ToolOutput {
            reached_end: saw_progress_end(&stderr),
            stdout,
            stderr,
        })
    }
}

/// `-progress` output is `key=value` lines terminated by `progress=end`.
fn saw_progress_end(stderr: &str) -> bool {
    stderr.lines().any(|line| line.trim() == "progress=end")
}

fn is_progress_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, _)) => {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    }
}

/// Last meaningful lines of the error stream, with progress chatter removed.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty() && !is_progress_line(l.trim()))
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
