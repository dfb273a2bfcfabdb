//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use relaycode_agent::{run_args, SessionInfo};
use relaycode_core::config::TelegramConfig;
use relaycode_sessions::SessionRegistry;

use crate::allow;
use crate::context::BridgeState;
use crate::relay::{relay, TelegramSink};
use crate::send;
use crate::typing::TypingHandle;

const WELCOME: &str = "relaycode — coding agent over Telegram\n\n\
Commands:\n\
/session - List all available sessions\n\
/set_session <session_id> - Set the current session\n\
/current_session - Show the current session\n\
/reset - Clear the current session\n\
Send any other message to run it with the agent\n\n\
Note: With no session set, the agent continues its most recent conversation.";

/// Main message handler registered in the teloxide Dispatcher.
///
/// Runs for every incoming `Message`. Performs:
/// 1. Bot-message filter
/// 2. Single-chat restriction check
/// 3. Slash command interception
/// 4. Non-blocking agent relay invocation
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<BridgeState>,
    config: TelegramConfig,
) -> ResponseResult<()> {
    // 1. Ignore messages from other bots and anything without text.
    if msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false) {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    // 2. Optional single-chat restriction.
    let chat_id = msg.chat.id.to_string();
    if !allow::is_allowed(config.allowed_chat.as_deref(), &chat_id) {
        return Ok(());
    }

    // 3. Slash command interception.
    match parse_command(text) {
        Some(("start", _)) | Some(("help", _)) => {
            send::send_plain(&bot, msg.chat.id, WELCOME).await;
            return Ok(());
        }
        Some(("session", _)) => {
            handle_session_list(&bot, &msg, &state).await;
            return Ok(());
        }
        Some(("set_session", arg)) => {
            handle_set_session(&bot, &msg, &state, &chat_id, arg).await;
            return Ok(());
        }
        Some(("current_session", _)) => {
            let reply = match state.sessions.get(&chat_id) {
                Some(id) => format!("Current session: {id}"),
                None => "No active session.".to_string(),
            };
            send::send_plain(&bot, msg.chat.id, &reply).await;
            return Ok(());
        }
        Some(("reset", _)) => {
            state.sessions.reset(&chat_id);
            send::send_plain(
                &bot,
                msg.chat.id,
                "Session cleared. The next message continues the agent's latest conversation.",
            )
            .await;
            return Ok(());
        }
        // Unknown commands fall through to the agent, like any other text.
        _ => {}
    }

    // 4. Relay the message through the agent, one task per conversation.
    let session = state.sessions.get(&chat_id);
    info!(chat = %chat_id, session = ?session, "relaying message to agent");

    let args = run_args(text, session.as_deref());
    let tg_chat = msg.chat.id;
    let state = Arc::clone(&state);

    tokio::spawn(async move {
        let typing = TypingHandle::start(bot.clone(), tg_chat);
        let sink = TelegramSink::new(bot, tg_chat);
        relay(&sink, &state.invoker, &args).await;
        typing.stop();
    });

    Ok(())
}

/// Handle `/session` — list the agent's sessions.
async fn handle_session_list(bot: &Bot, msg: &Message, state: &BridgeState) {
    let reply = match state.invoker.list_sessions().await {
        Ok(sessions) => format_session_list(&sessions),
        Err(e) => {
            warn!(error = %e, "session list failed");
            format!("Error retrieving sessions: {e}")
        }
    };
    send::send_plain(bot, msg.chat.id, &reply).await;
}

/// Handle `/set_session <id>` — validate against the live session list,
/// then store. Validation is fail-open: when the list cannot be fetched the
/// ID is accepted so a transient agent failure never blocks the user.
async fn handle_set_session(
    bot: &Bot,
    msg: &Message,
    state: &BridgeState,
    chat_id: &str,
    arg: &str,
) {
    let session_id = arg.trim();
    if session_id.is_empty() {
        send::send_plain(
            bot,
            msg.chat.id,
            "Please provide a session ID. Usage: /set_session <session_id>",
        )
        .await;
        return;
    }

    let valid = match state.invoker.list_sessions().await {
        Ok(sessions) => {
            let ids: Vec<String> = sessions.into_iter().map(|s| s.id).collect();
            SessionRegistry::validate(session_id, &ids)
        }
        Err(e) => {
            warn!(error = %e, "session validation degraded, accepting ID unchecked");
            true
        }
    };

    if !valid {
        send::send_plain(bot, msg.chat.id, "Invalid session ID.").await;
        return;
    }

    state.sessions.set(chat_id, session_id);
    send::send_plain(
        bot,
        msg.chat.id,
        &format!("Current session set to: {session_id}"),
    )
    .await;
}

/// Split `/cmd@bot rest` into `("cmd", "rest")`. Returns `None` for
/// non-command text.
fn parse_command(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim();
    let stripped = trimmed.strip_prefix('/')?;
    let (head, rest) = match stripped.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (stripped, ""),
    };
    // Commands in groups arrive as /cmd@botname.
    let cmd = head.split('@').next().unwrap_or(head);
    Some((cmd, rest))
}

/// Format the session list the way the chat shows it.
fn format_session_list(sessions: &[SessionInfo]) -> String {
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }
    let mut out = String::from("Available Sessions:");
    for session in sessions {
        out.push_str("\n- ");
        out.push_str(&session.id);
    }
    out
}
