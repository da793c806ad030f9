//! Small helpers shared across crates.

/// Whether an API key is actually usable: non-empty and not a `your-...`
/// placeholder copied from a sample config.
pub fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.starts_with("your-")
}

/// Collapse whitespace runs into single spaces and cut the result to at most
/// `max_chars` characters, appending `...` when anything was dropped.
///
/// Counts chars, not bytes, so multi-byte text is never split.
pub fn log_preview(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut count = 0usize;
    let mut truncated = false;

    for word in text.split_whitespace() {
        let sep = usize::from(!out.is_empty());
        let word_len = word.chars().count();
        if count + sep + word_len > max_chars {
            let room = max_chars.saturating_sub(count + sep);
            if room > 0 {
                if sep == 1 {
                    out.push(' ');
                }
                out.extend(word.chars().take(room));
            }
            truncated = true;
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        count += sep + word_len;
    }

    if truncated {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keys_rejected() {
        assert!(is_usable_api_key("sk-abc123"));
        assert!(!is_usable_api_key(""));
        assert!(!is_usable_api_key("   "));
        assert!(!is_usable_api_key("your-openai-api-key"));
    }

    #[test]
    fn short_text_unchanged() {
        assert_eq!(log_preview("a person waves", 80), "a person waves");
    }

    #[test]
    fn collapses_newlines() {
        assert_eq!(log_preview("line one\n\n  line two", 80), "line one line two");
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(log_preview("hello world", 5), "hello...");
        assert_eq!(log_preview("hello world", 8), "hello wo...");
    }

    #[test]
    fn empty_input() {
        assert_eq!(log_preview("", 10), "");
        assert_eq!(log_preview("   ", 10), "");
    }

    #[test]
    fn multibyte_chars_counted_as_one() {
        let s = "\u{1F600}\u{1F601}\u{1F602}";
        assert_eq!(log_preview(s, 2), "\u{1F600}\u{1F601}...");
    }

    #[test]
    fn zero_max() {
        assert_eq!(log_preview("hello", 0), "...");
    }
}
