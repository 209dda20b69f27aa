//! ContextAnalyzer (§4.3): derives document-level and local signals that
//! the adaptive threshold and whitelist stages consult. Signals are
//! computed once per document and cached on [`RedactionContext`]; nothing
//! downstream re-scans the whole text for them.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::document::Document;
use crate::span::ContextStrength;

/// Coarse document category, driving one factor of the threshold
/// composition (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ClinicalNote,
    LabReport,
    Referral,
    BillingStatement,
    Correspondence,
    Unknown,
}

impl DocumentType {
    /// Threshold-composition factor (§4.4): tighter documents (billing,
    /// correspondence) get a looser multiplier than free-text clinical notes
    /// where PHI is denser and more varied in form.
    pub fn threshold_factor(&self) -> f32 {
        match self {
            DocumentType::ClinicalNote => 0.85,
            DocumentType::LabReport => 0.9,
            DocumentType::Referral => 0.88,
            DocumentType::BillingStatement => 0.95,
            DocumentType::Correspondence => 0.92,
            DocumentType::Unknown => 1.0,
        }
    }
}

/// Clinical specialty inferred from vocabulary, the other document-level
/// threshold factor (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Psychiatry,
    Oncology,
    Cardiology,
    Pediatrics,
    Genetics,
    General,
}

impl Specialty {
    pub fn threshold_factor(&self) -> f32 {
        match self {
            // Higher-sensitivity specialties relax the threshold further.
            Specialty::Psychiatry | Specialty::Genetics => 0.85,
            Specialty::Oncology | Specialty::Pediatrics => 0.9,
            Specialty::Cardiology => 0.93,
            Specialty::General => 1.0,
        }
    }
}

/// Purpose of the downstream use of the redacted text, supplied by the
/// caller rather than inferred (§4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeOfUse {
    Treatment,
    Research,
    Operations,
    PublicRelease,
}

impl PurposeOfUse {
    pub fn threshold_factor(&self) -> f32 {
        match self {
            PurposeOfUse::Treatment => 1.0,
            PurposeOfUse::Operations => 0.92,
            PurposeOfUse::Research => 0.85,
            // Anything destined for public release gets the most aggressive
            // (lowest) multiplier: when in doubt, redact.
            PurposeOfUse::PublicRelease => 0.75,
        }
    }
}

static FIELD_LABELS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "name", "patient", "dob", "ssn", "mrn", "address", "phone", "email",
        "contact", "guardian", "emergency", "insurance", "policy", "account",
        "provider", "physician", "npi", "license", "fax", "zip",
    ]
    .into_iter()
    .collect()
});

static STRUCTURE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "or", "of", "to", "a", "an", "is", "was", "on", "at",
        "in", "for", "with", "by", "this", "that", "patient", "date", "note",
        "history", "exam", "assessment", "plan", "diagnosis",
    ]
    .into_iter()
    .collect()
});

static PSYCHIATRY_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["psychiatr", "depression", "anxiety", "bipolar", "therapy session", "counseling"]
        .into_iter()
        .collect()
});
static ONCOLOGY_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["oncolog", "tumor", "chemotherapy", "carcinoma", "malignan", "metasta"]
        .into_iter()
        .collect()
});
static CARDIOLOGY_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["cardiac", "cardiolog", "myocardial", "arrhythmia", "echocardiogram"]
        .into_iter()
        .collect()
});
static PEDIATRICS_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["pediatric", "newborn", "infant", "well-child", "immunization"]
        .into_iter()
        .collect()
});
static GENETICS_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["genetic", "genom", "mutation", "hereditary", "chromosom"]
        .into_iter()
        .collect()
});

static LAB_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["specimen", "reference range", "panel", "assay", "lab report"]
        .into_iter()
        .collect()
});
static REFERRAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["referral", "referring provider", "consult request"]
        .into_iter()
        .collect()
});
static BILLING_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["invoice", "balance due", "copay", "claim number", "statement date"]
        .into_iter()
        .collect()
});
static CORRESPONDENCE_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["dear", "sincerely", "regards", "to whom it may concern"]
        .into_iter()
        .collect()
});

/// Per-document classification and derived signals (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionContext {
    pub document_type: DocumentType,
    pub specialty: Specialty,
    pub purpose_of_use: PurposeOfUse,
    pub chaos_score: f32,
    pub ocr_suspected: bool,
}

impl RedactionContext {
    pub fn threshold_factor(&self) -> f32 {
        self.document_type.threshold_factor()
            * self.specialty.threshold_factor()
            * self.purpose_of_use.threshold_factor()
    }
}

pub struct ContextAnalyzer;

impl ContextAnalyzer {
    /// Classifies the document and computes chaos/OCR signals. `purpose_of_use`
    /// is caller-supplied (it isn't inferrable from text) and defaults to
    /// `Treatment` when absent.
    pub fn analyze(document: &Document, purpose_of_use: Option<PurposeOfUse>) -> RedactionContext {
        let lower = document.as_str().to_lowercase();

        RedactionContext {
            document_type: Self::classify_document_type(&lower),
            specialty: Self::classify_specialty(&lower),
            purpose_of_use: purpose_of_use.unwrap_or(PurposeOfUse::Treatment),
            chaos_score: Self::chaos_score(document.as_str()),
            ocr_suspected: Self::ocr_suspected(document.as_str()),
        }
    }

    fn classify_document_type(lower: &str) -> DocumentType {
        let scored = [
            (DocumentType::LabReport, count_hits(lower, &LAB_TERMS)),
            (DocumentType::Referral, count_hits(lower, &REFERRAL_TERMS)),
            (DocumentType::BillingStatement, count_hits(lower, &BILLING_TERMS)),
            (DocumentType::Correspondence, count_hits(lower, &CORRESPONDENCE_TERMS)),
        ];
        scored
            .into_iter()
            .filter(|(_, hits)| *hits > 0)
            .max_by_key(|(_, hits)| *hits)
            .map(|(doc_type, _)| doc_type)
            .unwrap_or(DocumentType::ClinicalNote)
    }

    fn classify_specialty(lower: &str) -> Specialty {
        let scored = [
            (Specialty::Psychiatry, count_hits(lower, &PSYCHIATRY_TERMS)),
            (Specialty::Oncology, count_hits(lower, &ONCOLOGY_TERMS)),
            (Specialty::Cardiology, count_hits(lower, &CARDIOLOGY_TERMS)),
            (Specialty::Pediatrics, count_hits(lower, &PEDIATRICS_TERMS)),
            (Specialty::Genetics, count_hits(lower, &GENETICS_TERMS)),
        ];
        scored
            .into_iter()
            .filter(|(_, hits)| *hits > 0)
            .max_by_key(|(_, hits)| *hits)
            .map(|(specialty, _)| specialty)
            .unwrap_or(Specialty::General)
    }

    /// Local signal: how strongly the text immediately around `offset`
    /// (code-point index) labels the region as a PHI field, e.g. "Name:" or
    /// "DOB -". Used by the adaptive threshold and whitelist stages.
    pub fn context_strength(document: &Document, offset: usize) -> ContextStrength {
        let window_start = offset.saturating_sub(24);
        let window = match document.slice(window_start, offset) {
            Ok(s) => s,
            Err(_) => return ContextStrength::None,
        };
        let lower = window.to_lowercase();

        let has_colon_label = FIELD_LABELS
            .iter()
            .any(|label| lower.contains(&format!("{label}:")) || lower.contains(&format!("{label} -")));
        if has_colon_label {
            return ContextStrength::Strong;
        }

        let has_bare_label = FIELD_LABELS.iter().any(|label| lower.contains(label));
        if has_bare_label {
            return ContextStrength::Moderate;
        }

        if lower.trim().is_empty() {
            ContextStrength::None
        } else {
            ContextStrength::Weak
        }
    }

    pub fn is_field_label(token: &str) -> bool {
        FIELD_LABELS.contains(token.to_lowercase().trim_end_matches(':'))
    }

    pub fn is_structure_word(token: &str) -> bool {
        STRUCTURE_WORDS.contains(token.to_lowercase().as_str())
    }

    /// Rough measure of how "noisy" the document is: ratio of non-alphanumeric,
    /// non-whitespace grapheme clusters. Feeds the OCR-suspicion heuristic and
    /// the audit report (§4.3, §4.4 "ocr" threshold factor). Counted by
    /// grapheme rather than code point so a combining accent or a multi-code-
    /// point emoji isn't double-counted as noise on top of its base character.
    fn chaos_score(text: &str) -> f32 {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        if graphemes.is_empty() {
            return 0.0;
        }
        let noisy = graphemes
            .iter()
            .filter(|g| {
                g.chars()
                    .next()
                    .is_some_and(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
            })
            .count();
        noisy as f32 / graphemes.len() as f32
    }

    fn ocr_suspected(text: &str) -> bool {
        // OCR output tends to mix digit/letter lookalikes inside otherwise
        // alphabetic tokens, e.g. "J0HN" or "SM1TH".
        text.split_whitespace().any(|token| {
            let has_letter = token.chars().any(|c| c.is_ascii_alphabetic());
            let has_digit = token.chars().any(|c| c.is_ascii_digit());
            has_letter && has_digit && token.chars().all(|c| c.is_ascii_alphanumeric())
        })
    }
}

fn count_hits(lower_text: &str, terms: &HashSet<&'static str>) -> usize {
    terms.iter().filter(|term| lower_text.contains(*term)).count()
}
