//! Dictionary-family detectors: name-list lookups and structural heuristics
//! that don't fit a finite regex grammar (§4.2).

use std::collections::HashSet;

use once_cell::sync::Lazy;
use smallvec::SmallVec;

use crate::context::RedactionContext;
use crate::detectors::Detector;
use crate::document::Document;
use crate::span::{CandidateSpan, DetectorFamily, PhiType};

/// Seed given-name list. Production deployments load a larger list via
/// `DictionaryFile` (§6); this is the built-in fallback.
static GIVEN_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "james", "john", "robert", "michael", "william", "david", "richard",
        "mary", "patricia", "jennifer", "linda", "elizabeth", "barbara",
        "susan", "jessica", "sarah", "karen", "maria", "carlos", "wei",
        "ahmed", "fatima", "raj", "priya",
    ]
    .into_iter()
    .collect()
});

static SURNAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "smith", "johnson", "williams", "brown", "jones", "garcia", "miller",
        "davis", "rodriguez", "martinez", "wilson", "anderson", "taylor",
        "thomas", "moore", "jackson", "martin", "lee", "perez", "thompson",
        "patel", "kim", "chen", "khan",
    ]
    .into_iter()
    .collect()
});

static STREET_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "street", "st", "avenue", "ave", "road", "rd", "boulevard", "blvd",
        "lane", "ln", "drive", "dr", "court", "ct", "way", "place", "pl",
        "circle", "cir", "terrace",
    ]
    .into_iter()
    .collect()
});

/// Eponymous phrases built on a surname (e.g. "Wilson's disease"). Flagged
/// as low-confidence `Name` candidates precisely so the whitelist's
/// non-PHI term bank (§4.5) has something to act on — without a candidate
/// there's nothing to disambiguate.
const EPONYM_PHRASES: &[&str] = &[
    "wilson's disease",
    "parkinson's disease",
    "alzheimer's disease",
    "crohn's disease",
    "graves' disease",
    "addison's disease",
    "down syndrome",
    "hodgkin's lymphoma",
];

/// Detects `Given Surname` bigrams against the seed name lists. §4.5
/// consults `PhiType::Name`'s dictionary membership to decide eponym
/// disambiguation, so this detector only fires on adjacency, not single
/// tokens.
#[derive(Default)]
pub struct NameDictionaryDetector;

impl Detector for NameDictionaryDetector {
    fn name(&self) -> &str {
        "dictionary.name"
    }

    fn phi_types(&self) -> &[PhiType] {
        std::slice::from_ref(&PhiType::Name)
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        let text = document.as_str();
        let tokens: Vec<(usize, usize, &str)> = token_spans(text);
        let mut out = Vec::new();

        for window in tokens.windows(2) {
            let [(start_byte, _, first), (_, end_byte, second)] = window else {
                continue;
            };
            let first_lower = first.to_lowercase();
            let second_lower = second.to_lowercase();

            let first_is_name = GIVEN_NAMES.contains(first_lower.as_str());
            let second_is_name = SURNAMES.contains(second_lower.as_str());
            if !(first_is_name && second_is_name) {
                continue;
            }
            if !starts_with_uppercase(first) || !starts_with_uppercase(second) {
                continue;
            }

            let Some(start) = document.code_point_at_byte(*start_byte) else {
                continue;
            };
            let Some(end) = document.code_point_at_byte(*end_byte) else {
                continue;
            };

            out.push(CandidateSpan {
                text: document.slice(start, end).unwrap_or_default().to_string(),
                start,
                end,
                phi_type: PhiType::Name,
                confidence: 0.8,
                priority: DetectorFamily::Dictionary.base_priority(),
                detector_name: self.name().to_string(),
                family: DetectorFamily::Dictionary,
                pattern: "given_surname_bigram".to_string(),
                window: SmallVec::new(),
                ambiguous_with: HashSet::new(),
            });
        }

        out
    }
}

/// Flags known eponymous-disease phrases as low-confidence `Name`
/// candidates, feeding the whitelist's eponym disambiguation (§4.5).
pub struct EponymPhraseDetector;

impl Detector for EponymPhraseDetector {
    fn name(&self) -> &str {
        "dictionary.eponym_phrase"
    }

    fn phi_types(&self) -> &[PhiType] {
        std::slice::from_ref(&PhiType::Name)
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        let text = document.as_str();
        let lower = text.to_lowercase();
        let mut out = Vec::new();

        for phrase in EPONYM_PHRASES {
            let mut search_from = 0usize;
            while let Some(relative) = lower.get(search_from..).and_then(|rest| rest.find(phrase)) {
                let byte_start = search_from + relative;
                let byte_end = byte_start + phrase.len();
                search_from = byte_end;

                let Some(start) = document.code_point_at_byte(byte_start) else {
                    continue;
                };
                let Some(end) = document.code_point_at_byte(byte_end) else {
                    continue;
                };

                out.push(CandidateSpan {
                    text: document.slice(start, end).unwrap_or_default().to_string(),
                    start,
                    end,
                    phi_type: PhiType::Name,
                    confidence: 0.6,
                    priority: DetectorFamily::Dictionary.base_priority(),
                    detector_name: self.name().to_string(),
                    family: DetectorFamily::Dictionary,
                    pattern: "eponym_phrase".to_string(),
                    window: SmallVec::new(),
                    ambiguous_with: HashSet::new(),
                });
            }
        }

        out
    }
}

/// Recognizes `<number> <word...> <Street|Ave|...>` spans (§4.2, §4.5
/// "street-address heuristic").
pub struct AddressHeuristicDetector;

impl Detector for AddressHeuristicDetector {
    fn name(&self) -> &str {
        "dictionary.address_heuristic"
    }

    fn phi_types(&self) -> &[PhiType] {
        std::slice::from_ref(&PhiType::Address)
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        let text = document.as_str();
        let tokens = token_spans(text);
        let mut out = Vec::new();

        for (idx, (start_byte, _, token)) in tokens.iter().enumerate() {
            if !token.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            // Look ahead up to 4 tokens for a street suffix.
            let mut end_idx = idx;
            let mut found_suffix = false;
            for (lookahead_idx, (_, end_byte, candidate)) in
                tokens.iter().enumerate().skip(idx + 1).take(4)
            {
                end_idx = lookahead_idx;
                if STREET_SUFFIXES.contains(candidate.to_lowercase().as_str()) {
                    found_suffix = true;
                    let _ = end_byte;
                    break;
                }
            }
            if !found_suffix || end_idx <= idx {
                continue;
            }

            let Some((_, end_byte, _)) = tokens.get(end_idx) else {
                continue;
            };
            let Some(start) = document.code_point_at_byte(*start_byte) else {
                continue;
            };
            let Some(end) = document.code_point_at_byte(*end_byte) else {
                continue;
            };

            out.push(CandidateSpan {
                text: document.slice(start, end).unwrap_or_default().to_string(),
                start,
                end,
                phi_type: PhiType::Address,
                confidence: 0.75,
                priority: DetectorFamily::Dictionary.base_priority(),
                detector_name: self.name().to_string(),
                family: DetectorFamily::Dictionary,
                pattern: "number_then_street_suffix".to_string(),
                window: SmallVec::new(),
                ambiguous_with: HashSet::new(),
            });
        }

        out
    }
}

fn starts_with_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Splits text into `(byte_start, byte_end, token)` whitespace-delimited
/// tokens, stripping trailing punctuation from each token's span.
fn token_spans(text: &str) -> Vec<(usize, usize, &str)> {
    let mut out = Vec::new();
    for (start, _) in text.match_indices(|c: char| !c.is_whitespace()) {
        if out.last().is_some_and(|&(_, end, _): &(usize, usize, &str)| start < end) {
            continue;
        }
        let Some(rest) = text.get(start..) else {
            continue;
        };
        let len = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        let Some(raw) = rest.get(..len) else {
            continue;
        };
        let trimmed = raw.trim_end_matches(|c: char| c.is_ascii_punctuation());
        if trimmed.is_empty() {
            continue;
        }
        out.push((start, start + trimmed.len(), trimmed));
    }
    out
}
