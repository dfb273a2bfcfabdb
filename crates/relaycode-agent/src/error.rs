use thiserror::Error;

/// Errors produced when invoking the agent CLI.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("agent command timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("agent command exited with code {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse agent output: {0}")]
    Parse(String),
}
