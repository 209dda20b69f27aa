//! Pattern-family detectors: finite-grammar regexes for PHI types that have
//! a syntactically recognizable shape (§4.2, §4.5 pattern-bypass set).
//!
//! Each regex is compiled once via `once_cell::sync::Lazy`, the same
//! module-level compiled-pattern convention `entities` uses for its own
//! regex tables, rather than per-call compilation.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashSet;

use crate::context::RedactionContext;
use crate::document::Document;
use crate::detectors::Detector;
use crate::span::{CandidateSpan, DetectorFamily, PhiType};

// Regex literals below are fixed at compile time; a malformed pattern is a
// build-time defect, not a runtime condition, so panicking during `Lazy`
// init (once, at first access) rather than threading a Result through every
// call site is the standard handling for this class of invariant.
#[allow(clippy::panic)]
static SSN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap_or_else(|e| panic!("invalid SSN_REGEX: {e}")));
#[allow(clippy::panic)]
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b")
        .unwrap_or_else(|e| panic!("invalid PHONE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static FAX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfax[:\s]+(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b")
        .unwrap_or_else(|e| panic!("invalid FAX_REGEX: {e}"))
});
#[allow(clippy::panic)]
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[\w.+-]+@[\w-]+\.[\w.-]+\b").unwrap_or_else(|e| panic!("invalid EMAIL_REGEX: {e}"))
});
#[allow(clippy::panic)]
static CREDIT_CARD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").unwrap_or_else(|e| panic!("invalid CREDIT_CARD_REGEX: {e}"))
});
#[allow(clippy::panic)]
static IP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap_or_else(|e| panic!("invalid IP_REGEX: {e}"))
});
#[allow(clippy::panic)]
static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bhttps?://[^\s]+\b").unwrap_or_else(|e| panic!("invalid URL_REGEX: {e}")));
#[allow(clippy::panic)]
static ZIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap_or_else(|e| panic!("invalid ZIP_REGEX: {e}")));
#[allow(clippy::panic)]
static MRN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bMRN[:\s#]*([A-Z0-9]{6,12})\b").unwrap_or_else(|e| panic!("invalid MRN_REGEX: {e}"))
});
#[allow(clippy::panic)]
static NPI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bNPI[:\s#]*(\d{10})\b").unwrap_or_else(|e| panic!("invalid NPI_REGEX: {e}"))
});
#[allow(clippy::panic)]
static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b").unwrap_or_else(|e| panic!("invalid DATE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static AGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3})[- ]year[- ]old\b").unwrap_or_else(|e| panic!("invalid AGE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static VEHICLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:VIN|license plate)[:\s#]*([A-Z0-9]{6,17})\b")
        .unwrap_or_else(|e| panic!("invalid VEHICLE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static DEVICE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:device\s*(?:serial|id))[:\s#]*([A-Za-z0-9-]{6,24})\b")
        .unwrap_or_else(|e| panic!("invalid DEVICE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static BIOMETRIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:fingerprint|retina|voiceprint)\s*id[:\s#]*([A-Za-z0-9-]{4,24})\b")
        .unwrap_or_else(|e| panic!("invalid BIOMETRIC_REGEX: {e}"))
});
#[allow(clippy::panic)]
static UNIQUE_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:record|patient)\s*id[:\s#]*([A-Za-z0-9-]{6,24})\b")
        .unwrap_or_else(|e| panic!("invalid UNIQUE_ID_REGEX: {e}"))
});
#[allow(clippy::panic)]
static ACCOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\baccount[:\s#]*(\d{6,16})\b").unwrap_or_else(|e| panic!("invalid ACCOUNT_REGEX: {e}"))
});
#[allow(clippy::panic)]
static HEALTH_PLAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:health\s*plan|policy)[:\s#]*([A-Za-z0-9-]{6,16})\b")
        .unwrap_or_else(|e| panic!("invalid HEALTH_PLAN_REGEX: {e}"))
});
#[allow(clippy::panic)]
static LICENSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\blicense[:\s#]*([A-Za-z0-9-]{5,16})\b").unwrap_or_else(|e| panic!("invalid LICENSE_REGEX: {e}"))
});
#[allow(clippy::panic)]
static PASSPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpassport[:\s#]*([A-Za-z0-9]{6,9})\b").unwrap_or_else(|e| panic!("invalid PASSPORT_REGEX: {e}"))
});

/// One compiled regex bound to the `PhiType` it produces candidates for.
struct RegexDetector {
    name: &'static str,
    phi_type: PhiType,
    regex: &'static Regex,
    /// Group index to capture as the matched span; `0` for the whole match.
    capture_group: usize,
    base_confidence: f32,
}

impl Detector for RegexDetector {
    fn name(&self) -> &str {
        self.name
    }

    fn phi_types(&self) -> &[PhiType] {
        std::slice::from_ref(&self.phi_type)
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        let text = document.as_str();
        let mut out = Vec::new();

        for captures in self.regex.captures_iter(text) {
            let Some(matched) = captures.get(self.capture_group) else {
                continue;
            };
            let Some(start) = document.code_point_at_byte(matched.start()) else {
                continue;
            };
            let Some(end) = document.code_point_at_byte(matched.end()) else {
                continue;
            };

            out.push(CandidateSpan {
                text: matched.as_str().to_string(),
                start,
                end,
                phi_type: self.phi_type,
                confidence: self.base_confidence,
                priority: DetectorFamily::Pattern.base_priority(),
                detector_name: self.name.to_string(),
                family: DetectorFamily::Pattern,
                pattern: self.name.to_string(),
                window: SmallVec::new(),
                ambiguous_with: HashSet::new(),
            });
        }

        out
    }
}

pub fn all_pattern_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(RegexDetector {
            name: "pattern.ssn",
            phi_type: PhiType::Ssn,
            regex: &SSN_REGEX,
            capture_group: 0,
            base_confidence: 0.95,
        }),
        Box::new(RegexDetector {
            name: "pattern.fax",
            phi_type: PhiType::Fax,
            regex: &FAX_REGEX,
            capture_group: 0,
            base_confidence: 0.9,
        }),
        Box::new(RegexDetector {
            name: "pattern.phone",
            phi_type: PhiType::Phone,
            regex: &PHONE_REGEX,
            capture_group: 0,
            base_confidence: 0.85,
        }),
        Box::new(RegexDetector {
            name: "pattern.email",
            phi_type: PhiType::Email,
            regex: &EMAIL_REGEX,
            capture_group: 0,
            base_confidence: 0.95,
        }),
        Box::new(RegexDetector {
            name: "pattern.credit_card",
            phi_type: PhiType::CreditCard,
            regex: &CREDIT_CARD_REGEX,
            capture_group: 0,
            base_confidence: 0.8,
        }),
        Box::new(RegexDetector {
            name: "pattern.ip",
            phi_type: PhiType::Ip,
            regex: &IP_REGEX,
            capture_group: 0,
            base_confidence: 0.7,
        }),
        Box::new(RegexDetector {
            name: "pattern.url",
            phi_type: PhiType::Url,
            regex: &URL_REGEX,
            capture_group: 0,
            base_confidence: 0.9,
        }),
        Box::new(RegexDetector {
            name: "pattern.zip",
            phi_type: PhiType::Zip,
            regex: &ZIP_REGEX,
            capture_group: 0,
            base_confidence: 0.5,
        }),
        Box::new(RegexDetector {
            name: "pattern.mrn",
            phi_type: PhiType::Mrn,
            regex: &MRN_REGEX,
            capture_group: 1,
            base_confidence: 0.95,
        }),
        Box::new(RegexDetector {
            name: "pattern.npi",
            phi_type: PhiType::Npi,
            regex: &NPI_REGEX,
            capture_group: 1,
            base_confidence: 0.95,
        }),
        Box::new(RegexDetector {
            name: "pattern.date",
            phi_type: PhiType::Date,
            regex: &DATE_REGEX,
            capture_group: 0,
            base_confidence: 0.75,
        }),
        Box::new(RegexDetector {
            name: "pattern.age",
            phi_type: PhiType::Age,
            regex: &AGE_REGEX,
            capture_group: 0,
            base_confidence: 0.8,
        }),
        Box::new(RegexDetector {
            name: "pattern.vehicle",
            phi_type: PhiType::Vehicle,
            regex: &VEHICLE_REGEX,
            capture_group: 1,
            base_confidence: 0.85,
        }),
        Box::new(RegexDetector {
            name: "pattern.device",
            phi_type: PhiType::Device,
            regex: &DEVICE_REGEX,
            capture_group: 1,
            base_confidence: 0.8,
        }),
        Box::new(RegexDetector {
            name: "pattern.biometric",
            phi_type: PhiType::Biometric,
            regex: &BIOMETRIC_REGEX,
            capture_group: 1,
            base_confidence: 0.85,
        }),
        Box::new(RegexDetector {
            name: "pattern.unique_id",
            phi_type: PhiType::UniqueId,
            regex: &UNIQUE_ID_REGEX,
            capture_group: 1,
            base_confidence: 0.75,
        }),
        Box::new(RegexDetector {
            name: "pattern.account",
            phi_type: PhiType::Account,
            regex: &ACCOUNT_REGEX,
            capture_group: 1,
            base_confidence: 0.8,
        }),
        Box::new(RegexDetector {
            name: "pattern.health_plan",
            phi_type: PhiType::HealthPlan,
            regex: &HEALTH_PLAN_REGEX,
            capture_group: 1,
            base_confidence: 0.8,
        }),
        Box::new(RegexDetector {
            name: "pattern.license",
            phi_type: PhiType::License,
            regex: &LICENSE_REGEX,
            capture_group: 1,
            base_confidence: 0.75,
        }),
        Box::new(RegexDetector {
            name: "pattern.passport",
            phi_type: PhiType::Passport,
            regex: &PASSPORT_REGEX,
            capture_group: 1,
            base_confidence: 0.85,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAnalyzer, PurposeOfUse};

    fn ctx_for(text: &str) -> crate::context::RedactionContext {
        ContextAnalyzer::analyze(&Document::from_str(text), Some(PurposeOfUse::Treatment))
    }

    #[test]
    fn ssn_detector_finds_match_and_code_point_offsets() {
        let text = "SSN is 123-45-6789 on file.";
        let doc = Document::from_str(text);
        let context = ctx_for(text);
        let detector = RegexDetector {
            name: "pattern.ssn",
            phi_type: PhiType::Ssn,
            regex: &SSN_REGEX,
            capture_group: 0,
            base_confidence: 0.95,
        };
        let found = detector.detect(&doc, &context);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.slice(found[0].start, found[0].end).unwrap_or(""), "123-45-6789");
    }

    #[test]
    fn email_and_phone_coexist_without_cross_matching() {
        let text = "Contact jane.doe@example.com or 555-123-4567";
        let doc = Document::from_str(text);
        let context = ctx_for(text);
        let email_hits = all_pattern_detectors()
            .into_iter()
            .find(|d| d.name() == "pattern.email")
            .map(|d| d.detect(&doc, &context))
            .unwrap_or_default();
        assert_eq!(email_hits.len(), 1);
        assert_eq!(email_hits[0].phi_type, PhiType::Email);
    }

    #[test]
    fn mrn_captures_only_the_identifier_group() {
        let text = "MRN: AB123456 admitted today";
        let doc = Document::from_str(text);
        let context = ctx_for(text);
        let detector = all_pattern_detectors()
            .into_iter()
            .find(|d| d.name() == "pattern.mrn")
            .unwrap_or_else(|| panic!("mrn detector missing"));
        let found = detector.detect(&doc, &context);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "AB123456");
    }

    #[test]
    fn unicode_prefix_does_not_shift_match_offsets() {
        let text = "café — SSN 123-45-6789";
        let doc = Document::from_str(text);
        let context = ctx_for(text);
        let detector = all_pattern_detectors()
            .into_iter()
            .find(|d| d.name() == "pattern.ssn")
            .unwrap_or_else(|| panic!("ssn detector missing"));
        let found = detector.detect(&doc, &context);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.slice(found[0].start, found[0].end).unwrap_or(""), "123-45-6789");
    }
}
