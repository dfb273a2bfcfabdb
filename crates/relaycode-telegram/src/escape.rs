//! MarkdownV2 escaping.
//!
//! Telegram's MarkdownV2 dialect reserves a fixed character set that must be
//! backslash-escaped in outgoing text. Two policies exist because rendered
//! stream bodies carry fenced code blocks whose backticks must survive,
//! while error reports and command replies are plain prose.
//!
//! `escape` is applied exactly once per outgoing message, never recursively.

/// Which reserved set to escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every MarkdownV2-reserved character. For plain prose.
    Full,
    /// Only the characters that commonly break rendering around fenced
    /// code blocks. Backticks and formatting markers pass through.
    Minimal,
}

const FULL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

const MINIMAL: &[char] = &['.', '-', '(', ')'];

/// Backslash-escape every reserved character, left to right, single pass.
/// Identity on text containing none of the reserved set.
pub fn escape(text: &str, policy: Policy) -> String {
    let reserved = match policy {
        Policy::Full => FULL,
        Policy::Minimal => MINIMAL,
    };

    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        if reserved.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_escapes_entire_reserved_set() {
        let input = "_*[]()~`>#+-=|{}.!";
        let escaped = escape(input, Policy::Full);
        for ch in input.chars() {
            assert!(escaped.contains(&format!("\\{ch}")), "missing \\{ch}");
        }
        assert_eq!(escaped.len(), input.len() * 2);
    }

    #[test]
    fn minimal_escapes_dots_dashes_parens_only() {
        assert_eq!(escape("a.b-c", Policy::Minimal), "a\\.b\\-c");
        assert_eq!(escape("(x)", Policy::Minimal), "\\(x\\)");
        // Backticks and formatting markers survive the minimal policy.
        assert_eq!(escape("```rust```", Policy::Minimal), "```rust```");
        assert_eq!(escape("*bold* _it_", Policy::Minimal), "*bold* _it_");
    }

    #[test]
    fn identity_without_reserved_characters() {
        let input = "Hello world 123 abc";
        assert_eq!(escape(input, Policy::Full), input);
        assert_eq!(escape(input, Policy::Minimal), input);
    }

    #[test]
    fn single_pass_does_not_double_escape_backslashes() {
        // A backslash is not in the reserved set; an already-escaped dot
        // gains exactly one more backslash only because of the dot itself.
        assert_eq!(escape("\\.", Policy::Full), "\\\\.");
    }

    #[test]
    fn multiline_text_is_escaped_per_character() {
        let escaped = escape("line1.\nline2!", Policy::Full);
        assert_eq!(escaped, "line1\\.\nline2\\!");
    }
}
