//! Character-based string helpers. Discord limits and stored caps count
//! characters, not bytes.

/// Longest prefix of `text` holding at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Like [`truncate_chars`] but appends `suffix` when something was cut,
/// keeping the total within `max` characters.
pub fn truncate_with_suffix(text: &str, max: usize, suffix: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(suffix.chars().count());
    format!("{}{}", truncate_chars(text, keep), suffix)
}

/// Rough token estimate used for budgets and stored counts
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_with_suffix() {
        assert_eq!(truncate_with_suffix("abcdef", 10, "..."), "abcdef");
        assert_eq!(truncate_with_suffix("abcdefghij", 6, "..."), "abc...");
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(&"a".repeat(400)), 100);
        assert_eq!(estimate_tokens("abc"), 0);
    }
}
