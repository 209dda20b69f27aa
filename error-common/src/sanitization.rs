//! Truncation guard for error messages that might otherwise quote a snippet
//! of the source document. The redaction engine never emits a full document
//! into an error, but callers building `Config`/`DictionaryInvalid` messages
//! from arbitrary file contents go through here first so the same cap
//! applies everywhere.

const MAX_SNIPPET_LEN: usize = 80;

pub struct MessageSanitizer {
    max_snippet_len: usize,
}

impl Default for MessageSanitizer {
    fn default() -> Self {
        Self {
            max_snippet_len: MAX_SNIPPET_LEN,
        }
    }
}

impl MessageSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_snippet_len(max_snippet_len: usize) -> Self {
        Self { max_snippet_len }
    }

    /// Truncates `data` to a safe length for inclusion in an error message,
    /// marking truncation so the reader knows it isn't the full value.
    pub fn truncate(&self, data: &str) -> String {
        if data.chars().count() <= self.max_snippet_len {
            return data.to_string();
        }
        let head: String = data.chars().take(self.max_snippet_len).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        let s = MessageSanitizer::new();
        assert_eq!(s.truncate("short"), "short");
    }

    #[test]
    fn long_strings_are_truncated_with_marker() {
        let s = MessageSanitizer::with_max_snippet_len(4);
        assert_eq!(s.truncate("hello world"), "hell…");
    }
}
