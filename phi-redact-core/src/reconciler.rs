//! Reconciler (§4.6): resolves overlapping candidate spans into a final,
//! non-overlapping set. This is the algorithmic core of the pipeline — every
//! other stage either produces candidates or consumes the reconciler's
//! output.
//!
//! Sort key (§4.6): `(start asc, -end, -priority, -disambiguationScore,
//! detectorName asc)`. Sorting first means the sweep below only ever needs
//! to look at the currently-accepted span, never re-scan accepted history.

use crate::context::{ContextAnalyzer, RedactionContext};
use crate::document::Document;
use crate::policy::Policy;
use crate::span::{CandidateSpan, DetectorFamily, DroppedCandidate, DroppedReason, Span};
use crate::thresholds::AdaptiveThresholds;
use crate::whitelist::Whitelist;

/// Result of [`Reconciler::reconcile`]: the spans that survived, plus every
/// dropped candidate with its reason, for the audit report (§4.6, §8).
pub struct ReconciliationResult {
    pub accepted: Vec<Span>,
    pub dropped: Vec<DroppedCandidate>,
}

pub struct Reconciler<'a> {
    policy: &'a Policy,
    thresholds: &'a AdaptiveThresholds<'a>,
    whitelist: &'a Whitelist<'a>,
    /// Hard ceiling on accepted spans per document, preventing pathological
    /// inputs (e.g. a document that's entirely SSNs) from producing
    /// unbounded output (§4.6 "candidate ceiling").
    candidate_ceiling: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        policy: &'a Policy,
        thresholds: &'a AdaptiveThresholds<'a>,
        whitelist: &'a Whitelist<'a>,
        candidate_ceiling: usize,
    ) -> Self {
        Self {
            policy,
            thresholds,
            whitelist,
            candidate_ceiling,
        }
    }

    pub fn reconcile(
        &self,
        mut candidates: Vec<CandidateSpan>,
        document: &Document,
        context: &RedactionContext,
    ) -> ReconciliationResult {
        let mut dropped = Vec::new();

        // Step 1: filter by policy (type disabled) and calibrated threshold.
        candidates.retain(|candidate| {
            if !self.policy.is_enabled(candidate.phi_type) {
                dropped.push(DroppedCandidate {
                    candidate: candidate.clone(),
                    reason: DroppedReason::TypeDisabled,
                    detail: None,
                });
                return false;
            }

            let context_strength = ContextAnalyzer::context_strength(document, candidate.start);
            let threshold = self
                .thresholds
                .threshold_for(candidate.phi_type, context, context_strength)
                .max(self.policy.min_confidence(candidate.phi_type));

            if candidate.confidence < threshold {
                dropped.push(DroppedCandidate {
                    candidate: candidate.clone(),
                    reason: DroppedReason::BelowThreshold,
                    detail: Some(format!("confidence {} < threshold {threshold}", candidate.confidence)),
                });
                return false;
            }

            if self.whitelist.should_drop(candidate, document) {
                dropped.push(DroppedCandidate {
                    candidate: candidate.clone(),
                    reason: DroppedReason::Whitelisted,
                    detail: None,
                });
                return false;
            }

            true
        });

        // Step 2: sort by the fixed precedence key. `sort_by` (stable) keeps
        // this deterministic across runs with identical inputs (§8 "order
        // invariance" / "determinism").
        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.end.cmp(&a.end))
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| disambiguation_score(b).partial_cmp(&disambiguation_score(a)).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.detector_name.cmp(&b.detector_name))
        });

        // Step 3: sweep-line overlap resolution.
        let mut accepted: Vec<CandidateSpan> = Vec::new();
        for candidate in candidates {
            if accepted.len() >= self.candidate_ceiling {
                dropped.push(DroppedCandidate {
                    candidate,
                    reason: DroppedReason::CandidateCeilingExceeded,
                    detail: Some(self.candidate_ceiling.to_string()),
                });
                continue;
            }

            let Some(last) = accepted.last_mut() else {
                accepted.push(candidate);
                continue;
            };

            if !last.overlaps(&candidate) {
                accepted.push(candidate);
                continue;
            }

            if last.contains(&candidate) {
                dropped.push(DroppedCandidate {
                    candidate,
                    reason: DroppedReason::SubsumedByLonger,
                    detail: None,
                });
                continue;
            }

            if candidate.contains(last) {
                // The new candidate fully contains the previously-accepted
                // one: it wins (longer span, same precedence tier already
                // resolved by the sort), so swap it in.
                let displaced = std::mem::replace(last, candidate);
                dropped.push(DroppedCandidate {
                    candidate: displaced,
                    reason: DroppedReason::SubsumedByLonger,
                    detail: None,
                });
                continue;
            }

            // Partial overlap, same phi_type, both soft-merge-eligible
            // families: extend the accepted span to cover both (§4.6 step 4).
            if last.phi_type == candidate.phi_type
                && last.family.allows_soft_merge()
                && candidate.family.allows_soft_merge()
            {
                last.end = last.end.max(candidate.end);
                last.start = last.start.min(candidate.start);
                last.confidence = last.confidence.max(candidate.confidence);
                dropped.push(DroppedCandidate {
                    candidate,
                    reason: DroppedReason::MergedIntoAnother,
                    detail: None,
                });
                continue;
            }

            // Genuine partial-overlap conflict: the sort already placed the
            // higher-precedence candidate first, so the later one loses.
            dropped.push(DroppedCandidate {
                candidate,
                reason: DroppedReason::LostOverlapTiebreak,
                detail: None,
            });
        }

        debug_assert!(no_overlaps(&accepted), "reconciler invariant violated: overlapping accepted spans");

        let accepted_spans = accepted
            .into_iter()
            .map(|candidate| Span {
                candidate: candidate.clone(),
                applied: false,
                replacement: None,
                disambiguation_score: disambiguation_score(&candidate),
                unreplaced: false,
            })
            .collect();

        ReconciliationResult {
            accepted: accepted_spans,
            dropped,
        }
    }
}

/// Derived score used as a sort tiebreak: confidence scaled by family base
/// priority, normalized to roughly `[0, 1]`.
fn disambiguation_score(candidate: &CandidateSpan) -> f32 {
    candidate.confidence * (candidate.priority as f32 / DetectorFamily::Pattern.base_priority() as f32)
}

fn no_overlaps(spans: &[CandidateSpan]) -> bool {
    spans.windows(2).all(|pair| {
        let [a, b] = pair else { return true };
        a.end <= b.start
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PurposeOfUse;
    use crate::span::TokenWindow;
    use std::collections::HashSet;

    fn candidate(
        start: usize,
        end: usize,
        phi_type: crate::span::PhiType,
        confidence: f32,
        priority: i32,
        family: DetectorFamily,
        detector_name: &str,
    ) -> CandidateSpan {
        CandidateSpan {
            text: "x".repeat(end - start),
            start,
            end,
            phi_type,
            confidence,
            priority,
            detector_name: detector_name.to_string(),
            family,
            pattern: "t".into(),
            window: TokenWindow::new(),
            ambiguous_with: HashSet::new(),
        }
    }

    fn setup() -> (Policy, AdaptiveThresholds<'static>, Whitelist<'static>) {
        (Policy::default_policy(), AdaptiveThresholds::new(None), Whitelist::new(None))
    }

    #[test]
    fn longer_span_subsumes_shorter_overlapping_one() {
        let (policy, thresholds, whitelist) = setup();
        let reconciler = Reconciler::new(&policy, &thresholds, &whitelist, 1000);
        let document = Document::from_str(&"x".repeat(20));
        let context = ContextAnalyzer::analyze(&document, Some(PurposeOfUse::Treatment));

        let short = candidate(2, 5, crate::span::PhiType::Name, 0.99, 70, DetectorFamily::Dictionary, "a");
        let long = candidate(0, 10, crate::span::PhiType::Name, 0.99, 70, DetectorFamily::Dictionary, "a");

        let result = reconciler.reconcile(vec![short, long], &document, &context);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].start(), 0);
        assert_eq!(result.accepted[0].end(), 10);
    }

    #[test]
    fn non_overlapping_candidates_are_all_accepted() {
        let (policy, thresholds, whitelist) = setup();
        let reconciler = Reconciler::new(&policy, &thresholds, &whitelist, 1000);
        let document = Document::from_str(&"x".repeat(20));
        let context = ContextAnalyzer::analyze(&document, Some(PurposeOfUse::Treatment));

        let a = candidate(0, 3, crate::span::PhiType::Ssn, 0.99, 80, DetectorFamily::Pattern, "a");
        let b = candidate(10, 13, crate::span::PhiType::Ssn, 0.99, 80, DetectorFamily::Pattern, "b");

        let result = reconciler.reconcile(vec![a, b], &document, &context);
        assert_eq!(result.accepted.len(), 2);
    }

    #[test]
    fn candidate_ceiling_caps_accepted_spans() {
        let (policy, thresholds, whitelist) = setup();
        let reconciler = Reconciler::new(&policy, &thresholds, &whitelist, 1);
        let document = Document::from_str(&"x".repeat(40));
        let context = ContextAnalyzer::analyze(&document, Some(PurposeOfUse::Treatment));

        let a = candidate(0, 3, crate::span::PhiType::Ssn, 0.99, 80, DetectorFamily::Pattern, "a");
        let b = candidate(10, 13, crate::span::PhiType::Ssn, 0.99, 80, DetectorFamily::Pattern, "b");

        let result = reconciler.reconcile(vec![a, b], &document, &context);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(
            result.dropped.iter().filter(|d| d.reason == DroppedReason::CandidateCeilingExceeded).count(),
            1
        );
    }

    #[test]
    fn accepted_spans_never_overlap() {
        let (policy, thresholds, whitelist) = setup();
        let reconciler = Reconciler::new(&policy, &thresholds, &whitelist, 1000);
        let document = Document::from_str(&"x".repeat(20));
        let context = ContextAnalyzer::analyze(&document, Some(PurposeOfUse::Treatment));

        let a = candidate(0, 8, crate::span::PhiType::Name, 0.9, 70, DetectorFamily::Dictionary, "a");
        let b = candidate(4, 12, crate::span::PhiType::Name, 0.6, 65, DetectorFamily::Phonetic, "b");

        let result = reconciler.reconcile(vec![a, b], &document, &context);
        let spans: Vec<CandidateSpan> = result.accepted.into_iter().map(|s| s.candidate).collect();
        assert!(no_overlaps(&spans));
    }
}
