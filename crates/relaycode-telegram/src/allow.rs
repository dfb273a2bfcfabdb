//! Single-chat restriction.
//!
//! The bridge is either open (no `allowed_chat` configured) or pinned to one
//! chat ID. There is no user-level allowlist; the agent CLI runs with the
//! operator's own credentials, so the restriction exists to keep a privately
//! deployed bot private.

/// Returns `true` when `chat_id` may interact with the bot.
///
/// `None` means no restriction is configured — every chat is served.
pub fn is_allowed(allowed_chat: Option<&str>, chat_id: &str) -> bool {
    match allowed_chat {
        None => true,
        Some(allowed) => allowed == chat_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_allows_any_chat() {
        assert!(is_allowed(None, "42"));
        assert!(is_allowed(None, "-100123"));
    }

    #[test]
    fn restricted_allows_only_the_configured_chat() {
        assert!(is_allowed(Some("42"), "42"));
        assert!(!is_allowed(Some("42"), "43"));
    }

    #[test]
    fn negative_group_ids_match_exactly() {
        assert!(is_allowed(Some("-100123"), "-100123"));
        assert!(!is_allowed(Some("-100123"), "100123"));
    }
}
