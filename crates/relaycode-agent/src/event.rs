//! Classification and rendering of the agent CLI's line-delimited JSON output.
//!
//! `opencode run --format json` emits one JSON object per stdout line, tagged
//! with a `type` field. Every line maps to exactly one [`AgentEvent`];
//! classification never fails — a line that is not valid JSON becomes
//! [`AgentEvent::Raw`] carrying the trimmed original text.

use serde_json::Value;

/// One decoded line of agent stream output.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Assistant text. The nested `part.text` field, when present, takes
    /// precedence over the top-level `text` field.
    Text(String),
    /// A tool invocation. Inputs are shown; outputs are intentionally
    /// dropped at decode time so large tool results never reach the chat.
    ToolUse {
        tool: String,
        status: String,
        input: Value,
    },
    /// Step boundary markers — never forwarded.
    StepStart,
    StepFinish,
    Error(String),
    Command(String),
    File { path: String, size: Option<String> },
    Directory(String),
    Completed,
    /// Valid JSON with an unrecognised (or missing) `type`.
    Unknown(Value),
    /// Not JSON at all, or a blank line.
    Raw(String),
}

impl AgentEvent {
    /// Decode one raw stdout line.
    pub fn classify(raw_line: &str) -> Self {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            return AgentEvent::Raw(String::new());
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => return AgentEvent::Raw(trimmed.to_string()),
        };

        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return AgentEvent::Unknown(value);
        };

        match kind {
            "step_start" => AgentEvent::StepStart,
            "step_finish" => AgentEvent::StepFinish,
            "text" => AgentEvent::Text(
                value
                    .pointer("/part/text")
                    .and_then(Value::as_str)
                    .or_else(|| value.get("text").and_then(Value::as_str))
                    .unwrap_or("")
                    .to_string(),
            ),
            "tool_use" => {
                let tool = value
                    .pointer("/part/tool")
                    .and_then(Value::as_str)
                    .or_else(|| value.get("tool_name").and_then(Value::as_str))
                    .or_else(|| value.get("tool").and_then(Value::as_str))
                    .unwrap_or("Unknown tool")
                    .to_string();
                let status = value
                    .pointer("/part/state/status")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let input = value
                    .pointer("/part/state/input")
                    .cloned()
                    .or_else(|| value.get("input").cloned())
                    .unwrap_or_else(|| Value::Object(Default::default()));
                AgentEvent::ToolUse {
                    tool,
                    status,
                    input,
                }
            }
            "error" => AgentEvent::Error(string_field(&value, "message")),
            "command" => AgentEvent::Command(string_field(&value, "command")),
            "file" => AgentEvent::File {
                path: string_field(&value, "path"),
                size: value.get("size").and_then(display_value),
            },
            "directory" => AgentEvent::Directory(string_field(&value, "path")),
            "completed" => AgentEvent::Completed,
            _ => AgentEvent::Unknown(value),
        }
    }

    /// Render this event as chat text. An empty string means the event is
    /// filtered and must not be forwarded.
    pub fn render(&self) -> String {
        match self {
            AgentEvent::Text(text) => text.clone(),
            AgentEvent::ToolUse {
                tool,
                status,
                input,
            } => {
                let mut out = format!("[{tool}]:\n");
                if !status.is_empty() {
                    out.push_str(&format!("Status: {status}\n"));
                }
                out.push_str("```\n");
                out.push_str(&format!("Input: {}\n", pretty(input)));
                out.push_str("```");
                out.trim_end().to_string()
            }
            AgentEvent::StepStart | AgentEvent::StepFinish => String::new(),
            AgentEvent::Error(message) => format!("Error: {message}"),
            AgentEvent::Command(command) => format!("Command: {command}"),
            AgentEvent::File { path, size } => match size {
                Some(size) => format!("File: {path} ({size})"),
                None => format!("File: {path}"),
            },
            AgentEvent::Directory(path) => format!("Directory: {path}"),
            AgentEvent::Completed => "Operation completed successfully.".to_string(),
            AgentEvent::Unknown(value) => pretty(value),
            AgentEvent::Raw(text) => text.clone(),
        }
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Human-readable form of a scalar JSON value (`"12 kB"` stays bare,
/// numbers print without quotes). `null` counts as absent.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
