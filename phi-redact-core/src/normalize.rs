//! NormalizationLayer (§4.1): canonicalizes raw text for downstream pattern
//! matchers while preserving a reversible offset map back to the raw
//! document.
//!
//! Per the Design Notes open question, OCR substitution is *not* applied in
//! the whole-document pass — it's ambiguous for names and numbers. It's
//! exposed separately as [`ocr_fold_numeric`]/[`ocr_fold_alpha`] for
//! detectors in a specific pattern family to opt into (§4.1 step 4).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::document::Document;

/// Cyrillic/Greek lookalikes mapped to their Latin homoglyph, the fixed
/// table referenced by §4.1 step 2. Not exhaustive — covers the characters
/// that are visually indistinguishable from Latin letters in most fonts
/// and are the ones actually seen in PHI-evasion attempts.
static HOMOGLYPH_TABLE: Lazy<Vec<(char, char)>> = Lazy::new(|| {
    vec![
        ('\u{0410}', 'A'), ('\u{0430}', 'a'),
        ('\u{0412}', 'B'),
        ('\u{0415}', 'E'), ('\u{0435}', 'e'),
        ('\u{041A}', 'K'), ('\u{043A}', 'k'),
        ('\u{041C}', 'M'),
        ('\u{041D}', 'H'),
        ('\u{041E}', 'O'), ('\u{043E}', 'o'),
        ('\u{0420}', 'P'), ('\u{0440}', 'p'),
        ('\u{0421}', 'C'), ('\u{0441}', 'c'),
        ('\u{0422}', 'T'),
        ('\u{0425}', 'X'), ('\u{0445}', 'x'),
        ('\u{0405}', 'S'), ('\u{0455}', 's'),
        ('\u{0406}', 'I'), ('\u{0456}', 'i'),
        ('\u{0408}', 'J'), ('\u{0458}', 'j'),
        ('\u{0391}', 'A'), ('\u{0392}', 'B'), ('\u{0395}', 'E'),
        ('\u{0396}', 'Z'), ('\u{0397}', 'H'), ('\u{0399}', 'I'),
        ('\u{039A}', 'K'), ('\u{039C}', 'M'), ('\u{039D}', 'N'),
        ('\u{039F}', 'O'), ('\u{03A1}', 'P'), ('\u{03A4}', 'T'),
        ('\u{03A5}', 'Y'), ('\u{03A7}', 'X'),
    ]
});

static INVISIBLE_CHARS: Lazy<Vec<char>> = Lazy::new(|| {
    vec![
        '\u{200B}', // zero width space
        '\u{200C}', // zero width non-joiner
        '\u{200D}', // zero width joiner
        '\u{FEFF}', // BOM / zero width no-break space
        '\u{00AD}', // soft hyphen
        '\u{200E}', // left-to-right mark
        '\u{200F}', // right-to-left mark
        '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}', // directional embedding/override
        '\u{2060}', // word joiner
    ]
});

/// Counters describing what normalization did to the raw text, surfaced on
/// the audit report (§4.1, §8 scenario 5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationSignals {
    pub homoglyph_substitutions: usize,
    pub invisibles_stripped: usize,
    pub malformed_input_substitutions: usize,
    pub mixed_script_detected: bool,
    pub suspicious_character_density: f32,
}

/// Maps a canonical code-point offset back to the originating raw code-point
/// offset. Monotone and total: built once per call, queried many times.
#[derive(Debug, Clone)]
pub struct OffsetMap {
    /// `raw_for_canonical[i]` is the raw offset corresponding to canonical
    /// offset `i`. One entry per canonical code point, plus a trailing
    /// sentinel equal to the raw length so end-of-span offsets resolve too.
    raw_for_canonical: Vec<usize>,
}

impl OffsetMap {
    pub fn map_to_raw(&self, canonical_offset: usize) -> usize {
        match self.raw_for_canonical.get(canonical_offset) {
            Some(raw) => *raw,
            None => self.raw_for_canonical.last().copied().unwrap_or(0),
        }
    }
}

/// Output of [`NormalizationLayer::normalize`].
pub struct NormalizedDocument {
    pub canonical: Document,
    pub map: OffsetMap,
    pub signals: NormalizationSignals,
}

pub struct NormalizationLayer;

impl NormalizationLayer {
    /// Runs the four-step pipeline from §4.1 (steps 1–3 unconditionally,
    /// step 4 only via the separate OCR-fold helpers below).
    pub fn normalize(raw: &Document) -> NormalizedDocument {
        let mut signals = NormalizationSignals {
            malformed_input_substitutions: raw.malformed_input_substitutions(),
            ..Default::default()
        };

        // Step 1: Unicode compatibility composition (NFKC), tracked per
        // output char back to the raw chars it was composed from.
        let raw_chars: Vec<char> = raw.chars().collect();
        let composed: Vec<char> = raw_chars.iter().copied().nfkc().collect();
        let mut canonical_chars = Vec::with_capacity(composed.len());
        let mut raw_for_canonical = Vec::with_capacity(composed.len() + 1);

        // NFKC can change the character count, so we re-derive the raw
        // offset alignment by re-walking raw text and matching composed
        // output incrementally. In the common case (ASCII / already-NFKC
        // text) this is a 1:1 walk; composed sequences advance the raw
        // cursor by however many raw chars normalized code the instant the
        // inserted composed chars correspond to.
        let mut raw_cursor = 0usize;
        let mut scripts_seen = std::collections::HashSet::new();

        for &raw_ch in &raw_chars {
            let piece: Vec<char> = std::iter::once(raw_ch).nfkc().collect();
            for composed_ch in piece {
                let (mapped, was_homoglyph) = fold_homoglyph(composed_ch);
                if was_homoglyph {
                    signals.homoglyph_substitutions += 1;
                }
                if is_invisible(mapped) {
                    signals.invisibles_stripped += 1;
                    continue;
                }
                canonical_chars.push(mapped);
                raw_for_canonical.push(raw_cursor);
                record_script(mapped, &mut scripts_seen);
            }
            raw_cursor += 1;
        }
        raw_for_canonical.push(raw_chars.len());

        signals.mixed_script_detected = scripts_seen.len() > 1;
        signals.suspicious_character_density = suspicious_density(&canonical_chars);

        let canonical_text: String = canonical_chars.into_iter().collect();

        NormalizedDocument {
            canonical: Document::from_str(&canonical_text),
            map: OffsetMap { raw_for_canonical },
            signals,
        }
    }

    /// Per-family OCR fold for a numeric pattern family (digits that look
    /// like letters get folded back to digits): O↔0, I/l↔1, S↔5, B↔8, Z↔2.
    pub fn ocr_fold_numeric(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                'I' | 'l' | 'i' => '1',
                'S' | 's' => '5',
                'B' => '8',
                'Z' | 'z' => '2',
                other => other,
            })
            .collect()
    }

    /// Per-family OCR fold for an alpha pattern family (digits that look
    /// like letters get folded to letters): 0→O, 1→I, 5→S, 8→B, 2→Z.
    pub fn ocr_fold_alpha(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '0' => 'O',
                '1' => 'I',
                '5' => 'S',
                '8' => 'B',
                '2' => 'Z',
                other => other,
            })
            .collect()
    }
}

fn fold_homoglyph(c: char) -> (char, bool) {
    for (from, to) in HOMOGLYPH_TABLE.iter() {
        if *from == c {
            return (*to, true);
        }
    }
    (c, false)
}

fn is_invisible(c: char) -> bool {
    INVISIBLE_CHARS.contains(&c)
}

fn record_script(c: char, scripts_seen: &mut std::collections::HashSet<&'static str>) {
    if c.is_whitespace() || c.is_ascii_punctuation() || c.is_ascii_digit() {
        return;
    }
    let script = if c.is_ascii_alphabetic() {
        "latin"
    } else if ('\u{0370}'..='\u{03FF}').contains(&c) {
        "greek"
    } else if ('\u{0400}'..='\u{04FF}').contains(&c) {
        "cyrillic"
    } else if ('\u{4E00}'..='\u{9FFF}').contains(&c) {
        "han"
    } else {
        return;
    };
    scripts_seen.insert(script);
}

fn suspicious_density(chars: &[char]) -> f32 {
    if chars.is_empty() {
        return 0.0;
    }
    let suspicious = chars
        .iter()
        .filter(|c| !c.is_ascii_graphic() && !c.is_whitespace())
        .count();
    suspicious as f32 / chars.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homoglyph_is_folded_and_counted() {
        let raw = Document::from_str("\u{0410}dam Smith");
        let normalized = NormalizationLayer::normalize(&raw);
        assert_eq!(normalized.canonical.as_str(), "Adam Smith");
        assert_eq!(normalized.signals.homoglyph_substitutions, 1);
    }

    #[test]
    fn invisible_characters_are_stripped() {
        let raw = Document::from_str("John\u{200B} Smith");
        let normalized = NormalizationLayer::normalize(&raw);
        assert_eq!(normalized.canonical.as_str(), "John Smith");
        assert_eq!(normalized.signals.invisibles_stripped, 1);
    }

    #[test]
    fn offset_map_resolves_back_to_raw_after_stripping() {
        let raw = Document::from_str("AB\u{200B}CD");
        let normalized = NormalizationLayer::normalize(&raw);
        // canonical "ABCD": index 2 ('C') came from raw index 3 ('C', after the ZWSP).
        assert_eq!(normalized.map.map_to_raw(2), 3);
    }

    #[test]
    fn plain_ascii_is_unchanged() {
        let raw = Document::from_str("Patient John Smith, SSN 123-45-6789");
        let normalized = NormalizationLayer::normalize(&raw);
        assert_eq!(normalized.canonical.as_str(), raw.as_str());
        assert_eq!(normalized.signals.homoglyph_substitutions, 0);
        assert_eq!(normalized.signals.invisibles_stripped, 0);
    }

    #[test]
    fn ocr_folds_are_opt_in_per_family_only() {
        assert_eq!(NormalizationLayer::ocr_fold_numeric("O1S"), "015");
        assert_eq!(NormalizationLayer::ocr_fold_alpha("015"), "OIS");
    }
}
