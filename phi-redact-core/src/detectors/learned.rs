//! Learned-family detector (§4.2): wraps an opaque statistical/ML model
//! behind the same [`Detector`] interface. No model is vendored — this
//! crate only defines the seam a caller plugs a real model into.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::context::RedactionContext;
use crate::detectors::Detector;
use crate::document::Document;
use crate::span::{CandidateSpan, DetectorFamily, PhiType};

/// A scored span proposed by an external model, in the model's own
/// coordinate space (code points, matching [`Document`]).
#[derive(Debug, Clone)]
pub struct LearnedPrediction {
    pub start: usize,
    pub end: usize,
    pub phi_type: PhiType,
    pub confidence: f32,
}

/// Runs inference over a document and returns candidate spans. Kept
/// deliberately opaque (no tensor/session types leak into this crate) so
/// any backend — an ONNX session, an HTTP call to a hosted model, a
/// rule-based stand-in for tests — can implement it.
pub trait LearnedModel: Send + Sync {
    fn predict(&self, document: &Document) -> Vec<LearnedPrediction>;
}

/// A model-less stand-in for environments with no learned detector
/// configured. Returns no candidates; the rest of the pipeline is
/// unaffected since every other family still runs.
#[derive(Default)]
pub struct NoopModel;

impl LearnedModel for NoopModel {
    fn predict(&self, _document: &Document) -> Vec<LearnedPrediction> {
        Vec::new()
    }
}

pub struct LearnedDetector<M: LearnedModel> {
    model: M,
    phi_types: Vec<PhiType>,
}

impl<M: LearnedModel> LearnedDetector<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            phi_types: PhiType::all().to_vec(),
        }
    }
}

impl<M: LearnedModel> Detector for LearnedDetector<M> {
    fn name(&self) -> &str {
        "learned.model"
    }

    fn phi_types(&self) -> &[PhiType] {
        &self.phi_types
    }

    fn detect(&self, document: &Document, _context: &RedactionContext) -> Vec<CandidateSpan> {
        self.model
            .predict(document)
            .into_iter()
            .filter_map(|prediction| {
                let text = document.slice(prediction.start, prediction.end).ok()?.to_string();
                Some(CandidateSpan {
                    text,
                    start: prediction.start,
                    end: prediction.end,
                    phi_type: prediction.phi_type,
                    confidence: prediction.confidence,
                    priority: DetectorFamily::Learned.base_priority(),
                    detector_name: self.name().to_string(),
                    family: DetectorFamily::Learned,
                    pattern: "learned_model".to_string(),
                    window: SmallVec::new(),
                    ambiguous_with: HashSet::new(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAnalyzer, PurposeOfUse};

    struct FixedModel(Vec<LearnedPrediction>);

    impl LearnedModel for FixedModel {
        fn predict(&self, _document: &Document) -> Vec<LearnedPrediction> {
            self.0.clone()
        }
    }

    #[test]
    fn noop_model_yields_no_candidates() {
        let detector = LearnedDetector::new(NoopModel);
        let text = "Patient John Smith";
        let doc = Document::from_str(text);
        let context = ContextAnalyzer::analyze(&doc, Some(PurposeOfUse::Treatment));
        assert!(detector.detect(&doc, &context).is_empty());
    }

    #[test]
    fn fixed_model_predictions_become_candidate_spans() {
        let text = "Patient John Smith";
        let model = FixedModel(vec![LearnedPrediction {
            start: 8,
            end: 18,
            phi_type: PhiType::Name,
            confidence: 0.9,
        }]);
        let detector = LearnedDetector::new(model);
        let doc = Document::from_str(text);
        let context = ContextAnalyzer::analyze(&doc, Some(PurposeOfUse::Treatment));
        let found = detector.detect(&doc, &context);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "John Smith");
    }
}
