//! Message sending for the bridge.
//!
//! Telegram's message limit is 4096 characters. We use 4090 for safety.
//! Text arrives here already escaped (see `escape`); these helpers never
//! escape again. MarkdownV2 is tried first with a plain-text fallback per
//! chunk, because a formatting rejection should not swallow the content.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::warn;

use crate::error::TelegramError;
use crate::escape::{escape, Policy};

/// Maximum characters per Telegram message (limit is 4096; we use 4090 for safety).
const CHUNK_MAX: usize = 4090;

/// Code-fence-aware message splitter.
///
/// When a split falls inside a fenced code block, the fence is closed before
/// the chunk boundary and re-opened (with its language) at the start of the
/// next chunk.
pub fn split_chunks_smart(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut fence_lang: Option<String> = None;

    for line in &lines {
        let cost = if current.is_empty() {
            line.len()
        } else {
            1 + line.len()
        };

        if !current.is_empty() && current.len() + cost > CHUNK_MAX {
            // Close any open fence before ending the chunk.
            if fence_lang.is_some() {
                current.push_str("\n```");
            }
            chunks.push(current);
            current = String::new();
            // Re-open the fence in the new chunk.
            if let Some(ref lang) = fence_lang {
                current.push_str("```");
                current.push_str(lang);
                current.push('\n');
            }
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        // Update fence tracking after appending.
        let trimmed = line.trim_start();
        if let Some(after_fence) = trimmed.strip_prefix("```") {
            if fence_lang.is_some() {
                fence_lang = None; // closing fence
            } else {
                fence_lang = Some(after_fence.trim().to_string()); // opening fence
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    // Safety net: force-split any chunk that still exceeds CHUNK_MAX
    // (e.g. a single line longer than 4090 chars).
    let mut result = Vec::new();
    for chunk in chunks {
        if chunk.len() <= CHUNK_MAX {
            result.push(chunk);
        } else {
            let mut remaining = chunk.as_str();
            while remaining.len() > CHUNK_MAX {
                // CHUNK_MAX is a byte offset; floor it to a char boundary
                // before slicing or multi-byte text panics.
                let mut limit = CHUNK_MAX;
                while !remaining.is_char_boundary(limit) {
                    limit -= 1;
                }
                let window = &remaining[..limit];
                let split_at = window
                    .rfind('\n')
                    .or_else(|| window.rfind(' '))
                    .unwrap_or(limit);
                result.push(remaining[..split_at].to_string());
                remaining = remaining[split_at..].trim_start();
            }
            if !remaining.is_empty() {
                result.push(remaining.to_string());
            }
        }
    }

    result
}

/// Send pre-escaped MarkdownV2 `text` to `chat_id` in smart-chunked messages.
///
/// Falls back to plain text per chunk when Telegram rejects the parse mode.
/// All chunks are attempted; the last failure, if any, is returned so the
/// caller can log it. A 100ms delay between chunks avoids rate limits.
pub async fn send_markdown(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
) -> Result<(), TelegramError> {
    let chunks = split_chunks_smart(text);
    let mut last_err = None;

    for (i, chunk) in chunks.iter().enumerate() {
        let sent = bot
            .send_message(chat_id, chunk)
            .parse_mode(ParseMode::MarkdownV2)
            .await;

        if sent.is_err() {
            // MarkdownV2 rejected — fall back to plain text.
            if let Err(e) = bot.send_message(chat_id, chunk).await {
                warn!(error = %e, chunk_index = i, "failed to send plain-text fallback");
                last_err = Some(TelegramError::Teloxide(e));
            }
        }

        if i + 1 < chunks.len() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    match last_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Escape `text` with the full policy and send it. For command replies and
/// other prose composed inside the bridge.
pub async fn send_plain(bot: &Bot, chat_id: ChatId, text: &str) {
    let escaped = escape(text, Policy::Full);
    if let Err(e) = send_markdown(bot, chat_id, &escaped).await {
        warn!(error = %e, "failed to send reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = split_chunks_smart("Hello, world!");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Hello, world!");
    }

    #[test]
    fn exactly_chunk_max_is_single_chunk() {
        let text = "a".repeat(CHUNK_MAX);
        let chunks = split_chunks_smart(&text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn over_limit_splits_on_newline() {
        let line = "a".repeat(2000);
        let text = format!("{line}\n{line}\n{line}");
        let chunks = split_chunks_smart(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX, "chunk too large: {}", c.len());
        }
    }

    #[test]
    fn multibyte_single_line_force_splits_on_char_boundaries() {
        // 3 bytes per char, 9000 bytes total, no newlines or spaces — the
        // force-split path must land on char boundaries, not raw byte 4090.
        let text = "€".repeat(3000);
        let chunks = split_chunks_smart(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX, "chunk too large: {}", c.len());
            assert!(c.chars().all(|ch| ch == '€'), "char split corrupted text");
        }
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert_eq!(total, 3000);
    }

    #[test]
    fn very_long_single_line_force_splits() {
        let text = "x".repeat(9000);
        let chunks = split_chunks_smart(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
    }

    #[test]
    fn code_fence_preserved_across_chunks() {
        let mut text = String::from("Intro.\n```\n");
        for i in 0..200 {
            text.push_str(&format!("let variable_name_{i:04} = {i:05}; // comment\n"));
        }
        text.push_str("```\nAfter fence.");

        let chunks = split_chunks_smart(&text);
        assert!(chunks.len() >= 2, "expected multiple chunks, got {}", chunks.len());
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX, "chunk too large: {}", c.len());
        }
    }

    #[test]
    fn code_fence_language_preserved() {
        let mut text = String::from("```python\n");
        for _ in 0..100 {
            text.push_str("print('hello world this is a reasonably long line of python code')\n");
        }
        text.push_str("```\n");

        let chunks = split_chunks_smart(&text);
        assert!(chunks.len() >= 2);
        assert!(
            chunks[1].starts_with("```python"),
            "second chunk should reopen with ```python, got: {}",
            &chunks[1][..chunks[1].len().min(60)]
        );
    }
}
