//! Agent CLI invocation — blocking capture-all and streaming line-by-line.
//!
//! Both modes spawn the same executable with `kill_on_drop`, so an abandoned
//! or timed-out invocation never leaves an orphaned child behind.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::error::AgentError;

/// Default deadline for blocking invocations.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured result of a successful blocking invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One entry of `session list --format json`. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Spawns the agent CLI by argument list.
#[derive(Debug, Clone)]
pub struct AgentInvoker {
    command: String,
    run_timeout: Duration,
}

impl AgentInvoker {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Deadline for blocking `run` calls. Streaming runs are unaffected.
    pub fn with_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    fn spawn(&self, args: &[String]) -> Result<Child, AgentError> {
        debug!(command = %self.command, ?args, "spawning agent CLI");
        Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AgentError::Spawn {
                command: self.command.clone(),
                source,
            })
    }

    /// Run to completion, capturing full stdout/stderr.
    ///
    /// Fails with [`AgentError::Timeout`] when the deadline elapses (the
    /// child is killed as its handle drops) and with [`AgentError::Exit`]
    /// on a non-zero exit code.
    pub async fn run(&self, args: &[String]) -> Result<CommandOutput, AgentError> {
        let child = self.spawn(args)?;

        let output = tokio::time::timeout(self.run_timeout, child.wait_with_output())
            .await
            .map_err(|_| AgentError::Timeout {
                secs: self.run_timeout.as_secs(),
            })?
            .map_err(AgentError::Io)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(AgentError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    /// Launch and expose stdout as an incremental line sequence.
    ///
    /// No overall deadline — interactive runs may stream for minutes. The
    /// sequence ends when the child closes stdout; stderr and the exit code
    /// are read afterwards via [`AgentStream::finish`].
    pub async fn stream(&self, args: &[String]) -> Result<AgentStream, AgentError> {
        let mut child = self.spawn(args)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Parse("child stdout not captured".to_string()))?;

        // Drain stderr in the background from the start; a child that fills
        // the stderr pipe while still streaming stdout would otherwise block.
        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf).await;
                buf
            })
        });

        Ok(AgentStream {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_task,
        })
    }

    /// Blocking `session list` + JSON decode.
    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, AgentError> {
        let output = self.run(&session_list_args()).await?;
        parse_session_list(&output.stdout)
    }
}

/// Live streaming invocation. Pull lines until `next_line` yields `None`,
/// then call [`finish`](AgentStream::finish) for stderr and the exit code.
/// Stderr is collected concurrently by a background task.
pub struct AgentStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<tokio::task::JoinHandle<String>>,
}

/// Residue of an exhausted stream.
#[derive(Debug, Clone)]
pub struct StreamExit {
    pub exit_code: i32,
    pub stderr: String,
}

impl AgentStream {
    /// Next stdout line, or `None` once the child closes stdout.
    /// Suspends until the child writes or exits.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Collect the drained stderr and reap the child.
    pub async fn finish(mut self) -> Result<StreamExit, AgentError> {
        let mut stderr = String::new();
        if let Some(task) = self.stderr_task.take() {
            stderr = task.await.unwrap_or_default();
        }
        let status = self.child.wait().await?;
        Ok(StreamExit {
            exit_code: status.code().unwrap_or(-1),
            stderr,
        })
    }
}

/// Argument vector for one `run` invocation.
///
/// With a session set the message continues it; otherwise `--continue`
/// resumes (or creates) the agent's own latest conversation.
pub fn run_args(message: &str, session: Option<&str>) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    match session {
        Some(id) => {
            args.push("--session".to_string());
            args.push(id.to_string());
        }
        None => args.push("--continue".to_string()),
    }
    args.push(message.to_string());
    args.push("--format".to_string());
    args.push("json".to_string());
    args
}

/// Argument vector for listing sessions.
pub fn session_list_args() -> Vec<String> {
    ["session", "list", "--format", "json"]
        .map(String::from)
        .to_vec()
}

/// Decode the `session list` JSON array.
pub fn parse_session_list(stdout: &str) -> Result<Vec<SessionInfo>, AgentError> {
    serde_json::from_str(stdout.trim())
        .map_err(|e| AgentError::Parse(format!("bad session list JSON: {e}")))
}
