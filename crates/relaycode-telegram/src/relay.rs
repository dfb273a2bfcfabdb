//! The streaming relay: agent stdout lines in, chat messages out.
//!
//! One relay call is one sequential pipeline — classify, render, escape,
//! forward — in strict arrival order. Failures stay local: a malformed line
//! becomes raw text, a failed delivery is logged and skipped, a launch
//! failure becomes a single error message. Nothing here may take down the
//! enclosing service.

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{debug, warn};

use relaycode_agent::{AgentEvent, AgentInvoker};

use crate::error::TelegramError;
use crate::escape::{escape, Policy};
use crate::send;

/// Outgoing-message seam between the relay and the chat transport.
///
/// The production implementation wraps a teloxide `Bot`; tests substitute a
/// recording mock.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one pre-escaped MarkdownV2 message.
    async fn send(&self, text: &str) -> Result<(), TelegramError>;
}

/// [`MessageSink`] backed by a teloxide `Bot` and a fixed chat.
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<(), TelegramError> {
        send::send_markdown(&self.bot, self.chat_id, text).await
    }
}

/// Stream one agent invocation into the sink.
///
/// Per line: classify → render → skip when empty → minimal-escape → send.
/// After the stream ends, residual stderr and a non-zero exit code are each
/// reported as one message. A spawn failure is reported and ends the relay;
/// no error escapes to the caller.
pub async fn relay<S: MessageSink + ?Sized>(sink: &S, invoker: &AgentInvoker, args: &[String]) {
    let mut stream = match invoker.stream(args).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "agent launch failed");
            report(sink, &format!("Error occurred while running command: {e}")).await;
            return;
        }
    };

    let mut line_no = 0usize;
    loop {
        match stream.next_line().await {
            Ok(Some(line)) => {
                line_no += 1;
                debug!(line_no, line = %line, "agent output line");
                let rendered = AgentEvent::classify(&line).render();
                if rendered.trim().is_empty() {
                    continue;
                }
                let outgoing = escape(&rendered, Policy::Minimal);
                if let Err(e) = sink.send(&outgoing).await {
                    // One bad message must not abort the rest of the stream.
                    warn!(error = %e, "delivery failed, continuing relay");
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "agent stdout read failed");
                break;
            }
        }
    }

    match stream.finish().await {
        Ok(exit) => {
            let stderr = exit.stderr.trim();
            if !stderr.is_empty() {
                warn!(stderr = %stderr, "agent stderr");
                report(sink, &format!("Error: {stderr}")).await;
            }
            if exit.exit_code != 0 {
                warn!(code = exit.exit_code, "agent exited non-zero");
                report(
                    sink,
                    &format!("Command failed with exit code {}", exit.exit_code),
                )
                .await;
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to reap agent process");
            report(sink, &format!("Error: {e}")).await;
        }
    }
}

/// Full-escape and send one bridge-generated message; delivery failures are
/// logged only.
async fn report<S: MessageSink + ?Sized>(sink: &S, text: &str) {
    let escaped = escape(text, Policy::Full);
    if let Err(e) = sink.send(&escaped).await {
        warn!(error = %e, "failed to deliver report message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every sent message; optionally fails selected sends.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl RecordingSink {
        fn failing_on(index: usize) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_on: Some(index),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send(&self, text: &str) -> Result<(), TelegramError> {
            let mut sent = self.sent.lock().unwrap();
            let index = sent.len();
            sent.push(text.to_string());
            if self.fail_on == Some(index) {
                return Err(TelegramError::Delivery("injected failure".to_string()));
            }
            Ok(())
        }
    }

    fn sh(script: &str) -> (AgentInvoker, Vec<String>) {
        (
            AgentInvoker::new("sh"),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[tokio::test]
    async fn forwards_text_lines_in_order_and_filters_step_markers() {
        let script = r#"printf '%s\n' '{"type":"text","text":"Hi"}' '{"type":"step_start"}' '{"type":"text","text":"Bye"}'"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        // Exit 0, empty stderr: exactly the two text lines, nothing else.
        assert_eq!(sink.messages(), vec!["Hi", "Bye"]);
    }

    #[tokio::test]
    async fn nonzero_exit_with_empty_stderr_reports_once() {
        let (invoker, args) = sh("exit 2");
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains('2'), "got: {}", messages[0]);
        assert!(messages[0].contains("Command failed with exit code"));
    }

    #[tokio::test]
    async fn stderr_is_reported_as_full_escaped_error_message() {
        let (invoker, args) = sh("echo 'broken pipe.' >&2");
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error:"));
        // Full policy escapes the dot.
        assert!(messages[0].contains("broken pipe\\."));
    }

    #[tokio::test]
    async fn launch_failure_becomes_one_message_and_returns() {
        let invoker = AgentInvoker::new("/definitely/not/a/binary");
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &["run".to_string()]).await;

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Error occurred while running command"));
    }

    #[tokio::test]
    async fn delivery_failure_does_not_abort_the_stream() {
        let script = r#"printf '%s\n' '{"type":"text","text":"one"}' '{"type":"text","text":"two"}' '{"type":"text","text":"three"}'"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::failing_on(0);

        relay(&sink, &invoker, &args).await;

        // The first send errors but all three lines are still attempted.
        assert_eq!(sink.messages(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn malformed_lines_are_forwarded_as_raw_text() {
        let script = r#"printf '%s\n' 'not json at all' '{"type":"text","text":"ok"}'"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        assert_eq!(sink.messages(), vec!["not json at all", "ok"]);
    }

    #[tokio::test]
    async fn blank_and_filtered_lines_produce_no_messages() {
        let script = r#"printf '%s\n' '' '{"type":"step_finish"}' '   '"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn rendered_body_uses_minimal_escaping() {
        let script = r#"printf '%s\n' '{"type":"text","text":"a.b-c"}'"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        assert_eq!(sink.messages(), vec!["a\\.b\\-c"]);
    }

    #[tokio::test]
    async fn tool_use_fences_survive_escaping() {
        let script = r#"printf '%s\n' '{"type":"tool_use","part":{"tool":"curl","state":{"status":"success","input":{"url":"http://x"}}}}'"#;
        let (invoker, args) = sh(script);
        let sink = RecordingSink::default();

        relay(&sink, &invoker, &args).await;

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("```"), "fences must not be escaped");
        assert!(messages[0].contains("Status: success"));
        assert!(messages[0].contains("url"));
    }
}
