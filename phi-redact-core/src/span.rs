//! Shared span types flowing between detectors, the reconciler, and the
//! applier. See `SPEC_FULL.md` §3 for the invariants these carry.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Closed enumeration of PHI categories. Extensible by policy only in the
/// sense that a policy may disable a variant — the set of variants itself
/// is fixed at build time, matching §3's "extensible by policy" note (the
/// extension point is `enabled`, not new variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiType {
    Name,
    Ssn,
    Phone,
    Email,
    Address,
    Date,
    Mrn,
    Npi,
    Ip,
    Url,
    CreditCard,
    Account,
    HealthPlan,
    License,
    Passport,
    Vehicle,
    Device,
    Biometric,
    UniqueId,
    Zip,
    Fax,
    Age,
}

impl PhiType {
    pub fn all() -> &'static [PhiType] {
        use PhiType::*;
        &[
            Name, Ssn, Phone, Email, Address, Date, Mrn, Npi, Ip, Url, CreditCard, Account,
            HealthPlan, License, Passport, Vehicle, Device, Biometric, UniqueId, Zip, Fax, Age,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhiType::Name => "NAME",
            PhiType::Ssn => "SSN",
            PhiType::Phone => "PHONE",
            PhiType::Email => "EMAIL",
            PhiType::Address => "ADDRESS",
            PhiType::Date => "DATE",
            PhiType::Mrn => "MRN",
            PhiType::Npi => "NPI",
            PhiType::Ip => "IP",
            PhiType::Url => "URL",
            PhiType::CreditCard => "CREDIT_CARD",
            PhiType::Account => "ACCOUNT",
            PhiType::HealthPlan => "HEALTH_PLAN",
            PhiType::License => "LICENSE",
            PhiType::Passport => "PASSPORT",
            PhiType::Vehicle => "VEHICLE",
            PhiType::Device => "DEVICE",
            PhiType::Biometric => "BIOMETRIC",
            PhiType::UniqueId => "UNIQUE_ID",
            PhiType::Zip => "ZIP",
            PhiType::Fax => "FAX",
            PhiType::Age => "AGE",
        }
    }

    /// PHI types produced by regex/finite-pattern detectors. Per §4.5, a
    /// candidate in this set bypasses structural-word whitelist rejection:
    /// a syntactically valid email is an email regardless of vocabulary.
    pub fn is_pattern_bypass(&self) -> bool {
        matches!(
            self,
            PhiType::Ssn
                | PhiType::Phone
                | PhiType::Email
                | PhiType::Ip
                | PhiType::Url
                | PhiType::Zip
                | PhiType::CreditCard
                | PhiType::Mrn
                | PhiType::Npi
                | PhiType::Fax
        )
    }
}

impl std::fmt::Display for PhiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The detector family a candidate came from, used for precedence bases and
/// soft-merge eligibility (§4.6 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorFamily {
    Pattern,
    Dictionary,
    Phonetic,
    Learned,
}

impl DetectorFamily {
    pub fn base_priority(&self) -> i32 {
        match self {
            DetectorFamily::Pattern => 80,
            DetectorFamily::Dictionary => 70,
            DetectorFamily::Phonetic => 65,
            DetectorFamily::Learned => 60,
        }
    }

    /// Whether candidates from this family may be soft-merged with an
    /// adjacent candidate of the same `phiType` (§4.6 step 4).
    pub fn allows_soft_merge(&self) -> bool {
        matches!(self, DetectorFamily::Dictionary | DetectorFamily::Phonetic)
    }
}

/// A small ordered window of neighboring tokens, used by context rules
/// (whitelist eponym disambiguation, field-label proximity). Bounded in
/// practice to a handful of tokens, hence `SmallVec` over `Vec`.
pub type TokenWindow = SmallVec<[String; 4]>;

/// A detector's proposed PHI region, before reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub phi_type: PhiType,
    pub confidence: f32,
    pub priority: i32,
    pub detector_name: String,
    pub family: DetectorFamily,
    /// Opaque provenance string for audit (e.g. the regex name or dictionary
    /// entry that fired).
    pub pattern: String,
    pub window: TokenWindow,
    pub ambiguous_with: HashSet<PhiType>,
}

impl CandidateSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &CandidateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &CandidateSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Closed enumeration of reasons a candidate can be dropped by the
/// reconciler, surfaced on the audit report (§4.6, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppedReason {
    TypeDisabled,
    BelowThreshold,
    Whitelisted,
    SubsumedByLonger,
    LostOverlapTiebreak,
    MergedIntoAnother,
    CandidateCeilingExceeded,
}

impl std::fmt::Display for DroppedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DroppedReason::TypeDisabled => "type_disabled",
            DroppedReason::BelowThreshold => "below_threshold",
            DroppedReason::Whitelisted => "whitelisted",
            DroppedReason::SubsumedByLonger => "subsumed_by_longer",
            DroppedReason::LostOverlapTiebreak => "lost_overlap_tiebreak",
            DroppedReason::MergedIntoAnother => "merged_into_another",
            DroppedReason::CandidateCeilingExceeded => "candidate_ceiling_exceeded",
        };
        write!(f, "{s}")
    }
}

/// A candidate dropped during reconciliation, retained for the audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedCandidate {
    pub candidate: CandidateSpan,
    pub reason: DroppedReason,
    pub detail: Option<String>,
}

/// A candidate that survived reconciliation and will be (or was) replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub candidate: CandidateSpan,
    pub applied: bool,
    pub replacement: Option<String>,
    pub disambiguation_score: f32,
    pub unreplaced: bool,
}

impl Span {
    pub fn start(&self) -> usize {
        self.candidate.start
    }

    pub fn end(&self) -> usize {
        self.candidate.end
    }

    pub fn phi_type(&self) -> PhiType {
        self.candidate.phi_type
    }
}

/// Categorical signal for how clearly surrounding text labels a region as a
/// specific PHI field (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextStrength {
    None,
    Weak,
    Moderate,
    Strong,
}

impl ContextStrength {
    /// Multiplier contributed to the adaptive threshold chain (§4.4):
    /// stronger context relaxes the threshold needed to redact.
    pub fn threshold_multiplier(&self) -> f32 {
        match self {
            ContextStrength::None => 1.0,
            ContextStrength::Weak => 0.95,
            ContextStrength::Moderate => 0.85,
            ContextStrength::Strong => 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_and_contains_are_symmetric_where_expected() {
        let make = |start: usize, end: usize| CandidateSpan {
            text: String::new(),
            start,
            end,
            phi_type: PhiType::Name,
            confidence: 0.9,
            priority: 80,
            detector_name: "t".into(),
            family: DetectorFamily::Pattern,
            pattern: "t".into(),
            window: TokenWindow::new(),
            ambiguous_with: HashSet::new(),
        };
        let outer = make(0, 10);
        let inner = make(2, 5);
        let disjoint = make(20, 25);

        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.overlaps(&disjoint));
    }

    #[test]
    fn pattern_bypass_set_matches_spec() {
        assert!(PhiType::Email.is_pattern_bypass());
        assert!(PhiType::Ssn.is_pattern_bypass());
        assert!(!PhiType::Name.is_pattern_bypass());
        assert!(!PhiType::Address.is_pattern_bypass());
    }

    #[test]
    fn context_strength_orders_monotonically() {
        assert!(ContextStrength::Strong.threshold_multiplier() < ContextStrength::Moderate.threshold_multiplier());
        assert!(ContextStrength::Moderate.threshold_multiplier() < ContextStrength::Weak.threshold_multiplier());
        assert!(ContextStrength::Weak.threshold_multiplier() < ContextStrength::None.threshold_multiplier());
    }
}
