//! Helpers for cleaning data before it goes into chat messages or logs.
//!
//! Messages are rendered with Telegram's HTML parse mode, so anything taken
//! from tool output or config must be escaped. Log lines must never carry the
//! bot token, which is part of the Bot API URL.

/// Escapes the three characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strips the bot token from a Bot API URL.
///
/// - `https://api.telegram.org/bot123:ABC/sendMessage` → `https://api.telegram.org/bot****/sendMessage`
/// - `https://example.com/hook` → unchanged
pub fn redact_bot_token(url: &str) -> String {
    if let Some(start) = url.find("/bot") {
        let token_start = start + "/bot".len();
        let rest = &url[token_start..];
        let token_end = rest.find('/').unwrap_or(rest.len());
        if token_end > 0 {
            return format!("{}****{}", &url[..token_start], &rest[token_end..]);
        }
    }
    url.to_string()
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("a <b> & \"c\""),
            "a &lt;b&gt; &amp; \"c\""
        );
        assert_eq!(escape_html("plain/path.txt"), "plain/path.txt");
    }

    #[test]
    fn test_redact_bot_token() {
        assert_eq!(
            redact_bot_token("https://api.telegram.org/bot123456:ABC-def/sendMessage"),
            "https://api.telegram.org/bot****/sendMessage"
        );
        assert_eq!(
            redact_bot_token("https://example.com/hook"),
            "https://example.com/hook"
        );
    }

    #[test]
    fn test_redact_does_not_leak_in_error_text() {
        let message = "error sending request for url (https://api.telegram.org/botSECRET/sendMessage)";
        let redacted = redact_bot_token(message);
        assert!(!redacted.contains("SECRET"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("äöü", 2), "äö");
        assert_eq!(truncate_chars("", 2), "");
    }
}
