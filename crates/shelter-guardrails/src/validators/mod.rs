//! Built-in validators
//!
//! Each validator compiles its pattern catalog at construction and holds only
//! immutable state afterwards. Pattern evaluation is total over strings: the
//! built-in `validate` implementations never return `Err`.

pub mod injection;
pub mod length;
pub mod pii;
pub mod schema;
pub mod toxicity;

/// Truncate a matched snippet to a character budget for finding descriptions.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::snippet;

    #[test]
    fn test_snippet_short_text_unchanged() {
        assert_eq!(snippet("hello", 10), "hello");
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("héllo wörld", 5), "héllo...");
    }
}
