//! AdaptiveThresholds (§4.4): composes the per-candidate confidence
//! threshold from document, context, and PHI-type factors, then applies an
//! optional feedback-learning correction.

use crate::context::RedactionContext;
use crate::feedback::FeedbackStore;
use crate::span::{ContextStrength, PhiType};

/// Floor/ceiling the composed threshold is clamped to (§4.4): below the
/// floor every candidate would redact regardless of confidence; above the
/// ceiling nothing ever would.
pub const THRESHOLD_FLOOR: f32 = 0.3;
pub const THRESHOLD_CEILING: f32 = 0.99;

/// Base per-type threshold before any contextual adjustment. Pattern-bypass
/// types (§4.5) start high because a syntactic match is already strong
/// evidence; free-text types like `Name`/`Address` start lower since they
/// depend more on context to disambiguate.
fn base_threshold(phi_type: PhiType) -> f32 {
    if phi_type.is_pattern_bypass() {
        0.6
    } else {
        0.45
    }
}

pub struct AdaptiveThresholds<'a> {
    feedback: Option<&'a FeedbackStore>,
}

impl<'a> AdaptiveThresholds<'a> {
    pub fn new(feedback: Option<&'a FeedbackStore>) -> Self {
        Self { feedback }
    }

    /// Composes `documentType × contextStrength × specialty × purposeOfUse ×
    /// phiType × ocr`, then applies any feedback-learning correction, then
    /// clamps to `[THRESHOLD_FLOOR, THRESHOLD_CEILING]` (§4.4).
    pub fn threshold_for(
        &self,
        phi_type: PhiType,
        context: &RedactionContext,
        context_strength: ContextStrength,
    ) -> f32 {
        let ocr_factor = if context.ocr_suspected { 0.9 } else { 1.0 };

        let composed = base_threshold(phi_type)
            * context.document_type.threshold_factor()
            * context_strength.threshold_multiplier()
            * context.specialty.threshold_factor()
            * context.purpose_of_use.threshold_factor()
            * ocr_factor;

        let corrected = match self.feedback {
            Some(store) => store.apply_correction(phi_type, composed),
            None => composed,
        };

        corrected.clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAnalyzer, PurposeOfUse};
    use crate::document::Document;

    #[test]
    fn composed_threshold_stays_within_clamp_bounds() {
        let doc = Document::from_str("Patient seen for routine follow-up.");
        let context = ContextAnalyzer::analyze(&doc, Some(PurposeOfUse::PublicRelease));
        let thresholds = AdaptiveThresholds::new(None);
        for phi_type in PhiType::all() {
            let t = thresholds.threshold_for(*phi_type, &context, ContextStrength::Strong);
            assert!((THRESHOLD_FLOOR..=THRESHOLD_CEILING).contains(&t));
        }
    }

    #[test]
    fn stronger_context_lowers_the_threshold() {
        let doc = Document::from_str("Patient seen for routine follow-up.");
        let context = ContextAnalyzer::analyze(&doc, Some(PurposeOfUse::Treatment));
        let thresholds = AdaptiveThresholds::new(None);
        let strong = thresholds.threshold_for(PhiType::Name, &context, ContextStrength::Strong);
        let none = thresholds.threshold_for(PhiType::Name, &context, ContextStrength::None);
        assert!(strong < none);
    }

    #[test]
    fn pattern_bypass_types_start_from_a_higher_base() {
        let doc = Document::from_str("text");
        let context = ContextAnalyzer::analyze(&doc, Some(PurposeOfUse::Treatment));
        let thresholds = AdaptiveThresholds::new(None);
        let email = thresholds.threshold_for(PhiType::Email, &context, ContextStrength::None);
        let name = thresholds.threshold_for(PhiType::Name, &context, ContextStrength::None);
        assert!(email > name);
    }
}
