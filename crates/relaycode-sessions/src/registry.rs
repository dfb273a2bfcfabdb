//! Per-chat session tracking.
//!
//! Each Telegram chat holds at most one "current session" of the agent CLI.
//! State is in-memory only — a restart forgets every chat's session and the
//! next message starts (or continues) one on the agent side.

use dashmap::DashMap;
use tracing::debug;

/// Thread-safe map from chat ID to its optional current session ID.
///
/// A chat entry is created lazily on first `set` and kept after `reset` so
/// `get` stays a plain lookup. All operations are atomic per chat ID via the
/// dashmap entry API; no cross-chat ordering is guaranteed or needed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: DashMap<String, Option<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session ID for `chat_id`, or `None` when the chat is unknown
    /// or its session was reset. Never errors.
    pub fn get(&self, chat_id: &str) -> Option<String> {
        self.inner.get(chat_id).and_then(|entry| entry.clone())
    }

    /// Set the current session for a chat, creating the entry if needed.
    /// Idempotent when called repeatedly with the same value.
    pub fn set(&self, chat_id: &str, session_id: &str) {
        debug!(chat_id, session_id, "session set");
        self.inner
            .insert(chat_id.to_string(), Some(session_id.to_string()));
    }

    /// Clear the current session without removing the chat entry.
    pub fn reset(&self, chat_id: &str) {
        debug!(chat_id, "session reset");
        self.inner
            .entry(chat_id.to_string())
            .and_modify(|v| *v = None)
            .or_insert(None);
    }

    /// Membership test against a list of session IDs known to the agent.
    ///
    /// The caller obtains `known` from `session list`; when that lookup
    /// fails the caller decides the degradation policy (fail-open here,
    /// see the Telegram handler).
    pub fn validate(session_id: &str, known: &[String]) -> bool {
        known.iter().any(|id| id == session_id)
    }
}
