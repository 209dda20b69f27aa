//! Document representation with O(1) code-point ↔ byte offset conversion.
//!
//! The open question in the source material (UTF-16 in the streaming path,
//! code points elsewhere) is resolved here: the whole crate measures offsets
//! in Unicode scalar values ("code points"), never UTF-16 units or bytes.
//! [`Document`] is the only place that talks to Rust's byte-indexed `&str`
//! API, so every other module can treat `start`/`end` as plain `usize`
//! code-point indices without re-deriving the conversion.

use error_common::{RedactionError, RedactionResult};

/// An immutable view over a text document, indexed by code point.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// `byte_offsets[i]` is the byte offset of the i-th code point;
    /// `byte_offsets[len()]` is `text.len()`.
    byte_offsets: Vec<usize>,
    replacement_count: usize,
}

impl Document {
    /// Builds a document from raw input, replacing any malformed byte
    /// sequences with `U+FFFD` and counting the substitutions (tracked in
    /// `NormalizationSignals` downstream via [`Document::replacement_count`]).
    pub fn from_raw_bytes(bytes: &[u8]) -> Self {
        let (text, replacement_count) = match std::str::from_utf8(bytes) {
            Ok(s) => (s.to_string(), 0),
            Err(_) => {
                let lossy = String::from_utf8_lossy(bytes).into_owned();
                let count = lossy.matches('\u{FFFD}').count();
                (lossy, count)
            }
        };
        Self::from_str_value(text, replacement_count)
    }

    pub fn from_str(text: &str) -> Self {
        Self::from_str_value(text.to_string(), 0)
    }

    fn from_str_value(text: String, replacement_count: usize) -> Self {
        let mut byte_offsets = Vec::with_capacity(text.len() + 1);
        for (byte_idx, _) in text.char_indices() {
            byte_offsets.push(byte_idx);
        }
        byte_offsets.push(text.len());
        Self {
            text,
            byte_offsets,
            replacement_count,
        }
    }

    /// Number of code points in the document.
    pub fn len(&self) -> usize {
        self.byte_offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn malformed_input_substitutions(&self) -> usize {
        self.replacement_count
    }

    fn byte_offset(&self, code_point_index: usize) -> RedactionResult<usize> {
        self.byte_offsets.get(code_point_index).copied().ok_or_else(|| {
            RedactionError::invariant_violation(format!(
                "code point index {code_point_index} out of bounds (len {})",
                self.len()
            ))
        })
    }

    /// Returns the substring covering the half-open code-point range
    /// `[start, end)`. Never splits a code point because both endpoints are
    /// resolved through the byte-offset table built from `char_indices`.
    pub fn slice(&self, start: usize, end: usize) -> RedactionResult<&str> {
        if start > end || end > self.len() {
            return Err(RedactionError::invariant_violation(format!(
                "invalid span [{start}, {end}) for document of length {}",
                self.len()
            )));
        }
        let byte_start = self.byte_offset(start)?;
        let byte_end = self.byte_offset(end)?;
        self.text.get(byte_start..byte_end).ok_or_else(|| {
            RedactionError::invariant_violation("span crosses a code point boundary".to_string())
        })
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.slice(index, index + 1).ok()?.chars().next()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars()
    }

    /// Converts a byte offset (as produced by `regex`, which operates on
    /// `&str`) into the code-point offset every other module speaks in.
    /// `None` if `byte_offset` doesn't fall on a code point boundary.
    pub fn code_point_at_byte(&self, byte_offset: usize) -> Option<usize> {
        self.byte_offsets.binary_search(&byte_offset).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let doc = Document::from_str("hello world");
        assert_eq!(doc.len(), 11);
        assert_eq!(doc.slice(0, 5).unwrap(), "hello");
        assert_eq!(doc.slice(6, 11).unwrap(), "world");
    }

    #[test]
    fn multibyte_code_points_never_split() {
        let doc = Document::from_str("café \u{1F600}!");
        // 'é' and the emoji are each one code point but multiple bytes.
        assert_eq!(doc.char_at(3), Some('é'));
        assert_eq!(doc.char_at(5), Some('\u{1F600}'));
        assert_eq!(doc.slice(0, 4).unwrap(), "café");
    }

    #[test]
    fn out_of_bounds_span_is_an_invariant_violation() {
        let doc = Document::from_str("hi");
        assert!(doc.slice(0, 5).is_err());
        assert!(doc.slice(3, 4).is_err());
    }

    #[test]
    fn malformed_utf8_is_replaced_and_counted() {
        let doc = Document::from_raw_bytes(&[0x68, 0x69, 0xFF, 0x21]);
        assert!(doc.as_str().contains('\u{FFFD}'));
        assert_eq!(doc.malformed_input_substitutions(), 1);
    }
}
