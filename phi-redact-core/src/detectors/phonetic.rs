//! Phonetic-family detector (§4.2): catches misspelled/OCR'd name variants
//! by sound rather than exact spelling, via a pluggable [`PhoneticOracle`].
//!
//! The oracle is kept as an opaque trait — algorithm choice (Soundex,
//! Metaphone, a vendor service) is a deployment decision, not something the
//! reconciler or applier needs to know about.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::context::RedactionContext;
use crate::detectors::Detector;
use crate::document::Document;
use crate::span::{CandidateSpan, DetectorFamily, PhiType};

/// Produces a phonetic code for a token, comparable for equality against a
/// reference name list's codes.
pub trait PhoneticOracle: Send + Sync {
    fn code(&self, token: &str) -> String;
}

/// American Soundex, the default oracle: cheap, dependency-free, and the
/// conventional baseline for this kind of fuzzy name match.
pub struct Soundex;

impl PhoneticOracle for Soundex {
    fn code(&self, token: &str) -> String {
        let upper: Vec<char> = token.to_uppercase().chars().filter(|c| c.is_ascii_alphabetic()).collect();
        let Some(&first) = upper.first() else {
            return String::new();
        };

        let digit = |c: char| -> Option<char> {
            match c {
                'B' | 'F' | 'P' | 'V' => Some('1'),
                'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
                'D' | 'T' => Some('3'),
                'L' => Some('4'),
                'M' | 'N' => Some('5'),
                'R' => Some('6'),
                _ => None,
            }
        };

        let mut code = String::new();
        code.push(first);
        let mut last_digit = digit(first);

        for &c in upper.iter().skip(1) {
            if code.len() >= 4 {
                break;
            }
            let this_digit = digit(c);
            if let Some(d) = this_digit {
                if Some(d) != last_digit {
                    code.push(d);
                }
            }
            last_digit = this_digit;
        }

        while code.len() < 4 {
            code.push('0');
        }
        code
    }
}

/// Matches tokens whose phonetic code collides with a reference surname
/// list, surfacing likely misspelled or OCR-garbled names.
pub struct PhoneticNameDetector<O: PhoneticOracle> {
    oracle: O,
    reference_codes: HashSet<String>,
}

impl PhoneticNameDetector<Soundex> {
    pub fn with_default_oracle(reference_surnames: &[&str]) -> Self {
        let oracle = Soundex;
        let reference_codes = reference_surnames.iter().map(|name| oracle.code(name)).collect();
        Self { oracle, reference_codes }
    }
}

impl<O: PhoneticOracle> Detector for PhoneticNameDetector<O> {
    fn name(&self) -> &str {
        "phonetic.name"
    }

    fn phi_types(&self) -> &[PhiType] {
        std::slice::from_ref(&PhiType::Name)
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        let text = document.as_str();
        let mut out = Vec::new();

        for (byte_start, _) in text.match_indices(|c: char| c.is_alphabetic()) {
            if out.iter().any(|c: &CandidateSpan| {
                document
                    .code_point_at_byte(byte_start)
                    .is_some_and(|cp| cp >= c.start && cp < c.end)
            }) {
                continue;
            }
            let Some(rest) = text.get(byte_start..) else {
                continue;
            };
            let len = rest.find(|c: char| !c.is_alphabetic()).unwrap_or(rest.len());
            let Some(token) = rest.get(..len) else {
                continue;
            };
            if token.len() < 3 || !token.chars().next().is_some_and(|c| c.is_uppercase()) {
                continue;
            }

            let code = self.oracle.code(token);
            if !self.reference_codes.contains(&code) {
                continue;
            }

            let byte_end = byte_start + token.len();
            let Some(start) = document.code_point_at_byte(byte_start) else {
                continue;
            };
            let Some(end) = document.code_point_at_byte(byte_end) else {
                continue;
            };

            out.push(CandidateSpan {
                text: token.to_string(),
                start,
                end,
                phi_type: PhiType::Name,
                confidence: 0.55,
                priority: DetectorFamily::Phonetic.base_priority(),
                detector_name: self.name().to_string(),
                family: DetectorFamily::Phonetic,
                pattern: format!("soundex:{code}"),
                window: SmallVec::new(),
                ambiguous_with: HashSet::new(),
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAnalyzer, PurposeOfUse};

    fn ctx_for(text: &str) -> RedactionContext {
        ContextAnalyzer::analyze(&Document::from_str(text), Some(PurposeOfUse::Treatment))
    }

    #[test]
    fn soundex_matches_known_reference_codes() {
        let soundex = Soundex;
        assert_eq!(soundex.code("Robert"), soundex.code("Rupert"));
        assert_eq!(soundex.code("Smith"), soundex.code("Smyth"));
    }

    #[test]
    fn phonetic_detector_finds_misspelled_surname_variant() {
        let detector = PhoneticNameDetector::with_default_oracle(&["Smith"]);
        let text = "Patient Smyth arrived at noon.";
        let doc = Document::from_str(text);
        let context = ctx_for(text);
        let found = detector.detect(&doc, &context);
        assert!(found.iter().any(|c| c.text == "Smyth"));
    }
}
