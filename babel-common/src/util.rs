//! Utility functions for Babel services.

use once_cell::sync::Lazy;
use regex::Regex;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Works on character boundaries, so multi-byte text (accents, emoji) is safe.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Telegram bot tokens appear inside request URLs: /bot123456:AA.../method
        (r"bot\d{5,}:[A-Za-z0-9_-]{20,}", "bot***REDACTED***"),
        (r"\b\d{5,}:[A-Za-z0-9_-]{30,}\b", "***REDACTED_BOT_TOKEN***"),
        (r"(?i)(token|secret|bearer)\s*[=:]\s*\S{10,}", "$1=***REDACTED***"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Sanitize a string for safe logging (redact bot tokens and similar secrets).
pub fn sanitize_for_log(s: &str) -> String {
    let mut result = s.to_string();
    for (re, replacement) in SECRET_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("hello", 10, "hello" ; "shorter than limit")]
    #[test_case("hello world", 5, "hello..." ; "ascii truncated")]
    #[test_case("¿Qué tal?", 4, "¿Qué..." ; "accented truncated")]
    #[test_case("", 10, "" ; "empty")]
    fn test_truncate_with_ellipsis(input: &str, max: usize, expected: &str) {
        assert_eq!(truncate_with_ellipsis(input, max), expected);
    }

    #[test]
    fn test_sanitize_bot_url() {
        let input = "error sending request for url (https://api.telegram.org/bot123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw/getUpdates)";
        let output = sanitize_for_log(input);
        assert!(!output.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"));
        assert!(output.contains("REDACTED"));
        assert!(output.ends_with("/getUpdates)"));
    }

    #[test]
    fn test_sanitize_leaves_plain_text() {
        assert_eq!(sanitize_for_log("message 42 not found"), "message 42 not found");
    }
}
