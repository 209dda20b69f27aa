//! Append-only feedback-learning store (§4.4, §6): records caller-reported
//! false positives/negatives per `PhiType` and nudges the adaptive
//! threshold accordingly. Guarded with `parking_lot::RwLock`, matching the
//! locking style the rest of the workspace uses for shared mutable state.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::span::PhiType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    /// Caller reports a span that was redacted but shouldn't have been.
    FalsePositive,
    /// Caller reports PHI that was missed.
    FalseNegative,
}

#[derive(Debug, Clone, Default)]
struct Tally {
    false_positives: u64,
    false_negatives: u64,
}

/// Per-`PhiType` running tally of reported feedback. Corrections are a
/// bounded nudge (±0.05 at most) so a single report can't swing the
/// threshold to an extreme; sustained one-sided feedback moves it further.
pub struct FeedbackStore {
    tallies: RwLock<HashMap<PhiType, Tally>>,
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self {
            tallies: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, phi_type: PhiType, kind: FeedbackKind) {
        let mut tallies = self.tallies.write();
        let entry = tallies.entry(phi_type).or_default();
        match kind {
            FeedbackKind::FalsePositive => entry.false_positives += 1,
            FeedbackKind::FalseNegative => entry.false_negatives += 1,
        }
    }

    /// Raises the threshold when false positives dominate (be stricter),
    /// lowers it when false negatives dominate (be looser), capped at a
    /// ±0.05 correction regardless of how lopsided the tally is.
    pub fn apply_correction(&self, phi_type: PhiType, threshold: f32) -> f32 {
        let tallies = self.tallies.read();
        let Some(tally) = tallies.get(&phi_type) else {
            return threshold;
        };
        let total = tally.false_positives + tally.false_negatives;
        if total == 0 {
            return threshold;
        }

        let signal = (tally.false_positives as f32 - tally.false_negatives as f32) / total as f32;
        let correction = (signal * 0.05).clamp(-0.05, 0.05);
        threshold + correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn false_positives_raise_the_threshold() {
        let store = FeedbackStore::new();
        for _ in 0..5 {
            store.record(PhiType::Name, FeedbackKind::FalsePositive);
        }
        let corrected = store.apply_correction(PhiType::Name, 0.5);
        assert!(corrected > 0.5);
    }

    #[test]
    fn false_negatives_lower_the_threshold() {
        let store = FeedbackStore::new();
        for _ in 0..5 {
            store.record(PhiType::Name, FeedbackKind::FalseNegative);
        }
        let corrected = store.apply_correction(PhiType::Name, 0.5);
        assert!(corrected < 0.5);
    }

    #[test]
    fn correction_is_bounded() {
        let store = FeedbackStore::new();
        for _ in 0..1000 {
            store.record(PhiType::Name, FeedbackKind::FalsePositive);
        }
        let corrected = store.apply_correction(PhiType::Name, 0.5);
        assert!(corrected <= 0.55);
    }

    #[test]
    fn no_feedback_means_no_correction() {
        let store = FeedbackStore::new();
        assert_eq!(store.apply_correction(PhiType::Name, 0.5), 0.5);
    }
}
