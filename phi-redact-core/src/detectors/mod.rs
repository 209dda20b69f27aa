//! Detector registry and fan-out (§4.2). Each detector family gets its own
//! submodule; this module defines the shared [`Detector`] trait and runs
//! every registered detector over a document in parallel via `rayon`.

pub mod dictionary;
pub mod learned;
pub mod pattern;
pub mod phonetic;

use rayon::prelude::*;

use crate::context::RedactionContext;
use crate::document::Document;
use crate::span::{CandidateSpan, PhiType};

/// A single detection strategy. Implementations are stateless or hold only
/// read-only compiled state (regexes, dictionaries), so `&self` fan-out
/// across `rayon` threads never needs interior mutability.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;
    fn phi_types(&self) -> &[PhiType];
    fn detect(&self, document: &Document, context: &RedactionContext) -> Vec<CandidateSpan>;
}

/// Holds the active set of detectors for a [`crate::Runtime`]. Construction
/// is the only place detector wiring happens; everything downstream just
/// calls [`DetectorRegistry::run_all`].
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// The full built-in registry: pattern detectors for every bypass-eligible
    /// type plus the dictionary-backed name/address detectors (§4.2).
    pub fn default_registry() -> Self {
        let mut detectors: Vec<Box<dyn Detector>> = pattern::all_pattern_detectors();
        detectors.push(Box::new(dictionary::NameDictionaryDetector::default()));
        detectors.push(Box::new(dictionary::AddressHeuristicDetector));
        detectors.push(Box::new(dictionary::EponymPhraseDetector));
        Self::new(detectors)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs every detector over the document concurrently and flattens the
    /// results. Detector order has no bearing on output: the reconciler's
    /// sort key is the sole source of precedence (§4.6).
    pub fn run_all(&self, document: &Document, context: &RedactionContext) -> Vec<CandidateSpan> {
        self.detectors
            .par_iter()
            .flat_map(|detector| detector.detect(document, context))
            .collect()
    }
}
