//! Whitelist / post-filter (§4.5): the last chance to drop a candidate
//! before reconciliation, based on a non-PHI term bank and a handful of
//! structural overrides.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::context::ContextAnalyzer;
use crate::document::Document;
use crate::span::{CandidateSpan, PhiType};

/// Categorized non-PHI terms that would otherwise collide with a
/// dictionary/phonetic name match (common words, eponymous disease names,
/// generic institution names).
static NON_PHI_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Eponymous conditions ("Wilson's disease", "Parkinson's").
        "wilson's disease", "parkinson's disease", "alzheimer's disease",
        "crohn's disease", "graves' disease", "addison's disease",
        "down syndrome", "hodgkin's lymphoma",
        // Generic institutional terms that can look like a name/address.
        "general hospital", "medical center", "health system", "urgent care",
    ]
    .into_iter()
    .collect()
});

/// Rules that override a whitelist drop back into a redaction, or vice
/// versa (§4.5 "eponym disambiguation").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilterRules {
    #[serde(default)]
    pub extra_non_phi_terms: Vec<String>,
    #[serde(default)]
    pub extra_person_indicators: Vec<String>,
}

pub struct Whitelist<'a> {
    rules: Option<&'a PostFilterRules>,
}

impl<'a> Whitelist<'a> {
    pub fn new(rules: Option<&'a PostFilterRules>) -> Self {
        Self { rules }
    }

    /// `true` if `candidate` should be dropped as a non-PHI term. Pattern-
    /// bypass types (§4.5) never reach the whitelist check at all — the
    /// reconciler skips calling this for them.
    pub fn should_drop(&self, candidate: &CandidateSpan, document: &Document) -> bool {
        if candidate.phi_type.is_pattern_bypass() {
            return false;
        }

        let lower = candidate.text.to_lowercase();

        if NON_PHI_TERMS.contains(lower.as_str()) {
            return !self.has_person_indicator(candidate, document);
        }
        if let Some(rules) = self.rules {
            if rules.extra_non_phi_terms.iter().any(|term| term.to_lowercase() == lower) {
                return !self.has_person_indicator(candidate, document);
            }
        }

        if candidate.phi_type == PhiType::Name && ContextAnalyzer::is_structure_word(&lower) {
            return true;
        }

        false
    }

    /// Overrides a whitelist drop when the surrounding text carries a
    /// person indicator (e.g. "Dr." immediately before "Wilson" means it's
    /// the physician's name, not the eponymous disease).
    fn has_person_indicator(&self, candidate: &CandidateSpan, document: &Document) -> bool {
        let window_start = candidate.start.saturating_sub(8);
        let preceding = document.slice(window_start, candidate.start).unwrap_or("").to_lowercase();

        let mut indicators: Vec<&str> = vec!["dr.", "dr ", "mr.", "mrs.", "ms.", "prof.", "patient"];
        if let Some(rules) = self.rules {
            indicators.extend(rules.extra_person_indicators.iter().map(String::as_str));
        }

        indicators.iter().any(|indicator| preceding.trim_end().ends_with(indicator.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candidate(text: &str, start: usize, end: usize, phi_type: PhiType) -> CandidateSpan {
        CandidateSpan {
            text: text.to_string(),
            start,
            end,
            phi_type,
            confidence: 0.8,
            priority: 70,
            detector_name: "t".into(),
            family: crate::span::DetectorFamily::Dictionary,
            pattern: "t".into(),
            window: Default::default(),
            ambiguous_with: Default::default(),
        }
    }

    #[test]
    fn eponymous_disease_name_is_whitelisted() {
        let text = "Patient diagnosed with Wilson's disease last year.";
        let document = Document::from_str(text);
        let start = text.find("Wilson's disease").unwrap_or(0);
        let candidate = make_candidate("Wilson's disease", start, start + 16, PhiType::Name);
        let whitelist = Whitelist::new(None);
        assert!(whitelist.should_drop(&candidate, &document));
    }

    #[test]
    fn person_indicator_overrides_the_whitelist() {
        let text = "Seen by Dr. Wilson's disease clinic team.";
        let document = Document::from_str(text);
        let start = text.find("Wilson's disease").unwrap_or(0);
        let candidate = make_candidate("Wilson's disease", start, start + 16, PhiType::Name);
        let whitelist = Whitelist::new(None);
        assert!(!whitelist.should_drop(&candidate, &document));
    }

    #[test]
    fn pattern_bypass_candidates_never_reach_the_whitelist() {
        let text = "jane.doe@example.com";
        let document = Document::from_str(text);
        let candidate = make_candidate(text, 0, text.len(), PhiType::Email);
        let whitelist = Whitelist::new(None);
        assert!(!whitelist.should_drop(&candidate, &document));
    }
}
