//! HIPAA PHI detection and redaction pipeline.
//!
//! Text flows through normalization, parallel detector fan-out, adaptive
//! thresholding, whitelist filtering, reconciliation, and replacement
//! application (§4 of the design). Batch callers use [`redact`]; long-lived
//! or chunked input uses [`StreamingController`] via [`Runtime::streaming`].
//!
//! Long-lived state — the detector registry, policy, and feedback store —
//! lives on [`Runtime`], which a caller constructs once and reuses across
//! calls rather than rebuilding per document.
//!
//! # Example
//!
//! ```rust
//! use phi_redact_core::{redact, RedactionOptions};
//!
//! let report = redact("Patient SSN is 123-45-6789", &RedactionOptions::default());
//! assert!(report.redacted_text.contains("[SSN]"));
//! ```
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)
)]

pub mod applier;
pub mod config;
pub mod context;
pub mod detectors;
pub mod document;
pub mod feedback;
pub mod logging;
pub mod normalize;
pub mod policy;
pub mod reconciler;
pub mod report;
pub mod span;
pub mod streaming;
pub mod thresholds;
pub mod whitelist;

pub use config::{CalibrationFile, ConfigValidator, FeaturesFile, ThresholdsFile};
pub use context::{ContextAnalyzer, DocumentType, PurposeOfUse, RedactionContext, Specialty};
pub use document::Document;
pub use error_common::{RedactionError, RedactionResult};
pub use feedback::{FeedbackKind, FeedbackStore};
pub use policy::{Policy, RedactionOptions, ReplacementStyle};
pub use report::RedactionReport;
pub use span::{CandidateSpan, ContextStrength, DroppedCandidate, DroppedReason, PhiType, Span};
pub use streaming::{SafePrefixMode, StreamingChunk, StreamingController, StreamingState};
pub use whitelist::PostFilterRules;

use std::time::Instant;

use detectors::DetectorRegistry;
use normalize::NormalizationLayer;
use reconciler::Reconciler;

/// Owns the long-lived pipeline state: the detector registry, the active
/// policy, the feedback-learning store, and optional post-filter rules. A
/// caller constructs one `Runtime` and reuses it across every `redact`
/// call instead of rebuilding detectors/dictionaries per document.
pub struct Runtime {
    registry: DetectorRegistry,
    policy: Policy,
    feedback: FeedbackStore,
    post_filter_rules: Option<PostFilterRules>,
    candidate_ceiling: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            registry: DetectorRegistry::default_registry(),
            policy: Policy::default_policy(),
            feedback: FeedbackStore::new(),
            post_filter_rules: None,
            candidate_ceiling: 10_000,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> RedactionResult<Self> {
        policy.validate_policy()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn with_post_filter_rules(mut self, rules: PostFilterRules) -> RedactionResult<Self> {
        rules.validate()?;
        self.post_filter_rules = Some(rules);
        Ok(self)
    }

    pub fn with_candidate_ceiling(mut self, ceiling: usize) -> Self {
        self.candidate_ceiling = ceiling;
        self
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Runs the full pipeline over `text` once, applying `options` on top
    /// of this runtime's policy, and returns the redacted text plus audit
    /// report (§4, §6).
    pub fn redact(&self, text: &str, options: &RedactionOptions) -> RedactionReport {
        let policy = self.policy.with_options(options);

        let raw = Document::from_str(text);
        let normalize_start = Instant::now();
        let normalized = NormalizationLayer::normalize(&raw);
        let normalize_elapsed = normalize_start.elapsed();

        let context = ContextAnalyzer::analyze(&normalized.canonical, options.purpose_of_use);

        let detect_start = Instant::now();
        let candidates = self.registry.run_all(&normalized.canonical, &context);
        let detect_elapsed = detect_start.elapsed();

        let thresholds = thresholds::AdaptiveThresholds::new(Some(&self.feedback));
        let whitelist = whitelist::Whitelist::new(self.post_filter_rules.as_ref());
        let reconciler = Reconciler::new(&policy, &thresholds, &whitelist, self.candidate_ceiling);

        let reconcile_start = Instant::now();
        let reconciliation = reconciler.reconcile(candidates, &normalized.canonical, &context);
        let reconcile_elapsed = reconcile_start.elapsed();

        let apply_start = Instant::now();
        let applier = applier::ReplacementApplier::new(&policy);
        let applied = applier.apply(&normalized.canonical, reconciliation.accepted);
        let apply_elapsed = apply_start.elapsed();

        RedactionReport::build(
            applied.redacted_text,
            applied.spans,
            reconciliation.dropped,
            normalized.signals,
            &context,
            report::StageTimings {
                normalize: normalize_elapsed,
                detect: detect_elapsed,
                reconcile: reconcile_elapsed,
                apply: apply_elapsed,
            },
        )
    }

    /// Builds a [`StreamingController`] bound to this runtime's registry
    /// and policy (with `options` applied), for chunked/long-lived input
    /// (§4.8).
    pub fn streaming(&self, options: &RedactionOptions) -> StreamingController<'_> {
        let policy = self.policy.with_options(options);
        let purpose_of_use = Some(options.purpose_of_use.unwrap_or(PurposeOfUse::Treatment));
        StreamingController::new(&self.registry, policy, purpose_of_use, self.candidate_ceiling)
    }
}

/// Convenience entry point for one-off batch redaction (§6). Builds a
/// fresh [`Runtime`] per call; a caller doing many calls should construct
/// a `Runtime` directly and reuse it instead.
pub fn redact(text: &str, options: &RedactionOptions) -> RedactionReport {
    Runtime::new().redact(text, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_replaces_an_ssn_with_default_options() {
        let report = redact("Patient SSN is 123-45-6789 on file.", &RedactionOptions::default());
        assert!(report.redacted_text.contains("[SSN]"));
        assert!(!report.redacted_text.contains("123-45-6789"));
    }

    #[test]
    fn redact_respects_disabled_types() {
        let options = RedactionOptions {
            disabled_types: Some(vec![PhiType::Ssn]),
            ..Default::default()
        };
        let report = redact("Patient SSN is 123-45-6789 on file.", &options);
        assert!(report.redacted_text.contains("123-45-6789"));
    }

    #[test]
    fn runtime_reuse_produces_consistent_results() {
        let runtime = Runtime::new();
        let options = RedactionOptions::default();
        let first = runtime.redact("Email jane@example.com", &options);
        let second = runtime.redact("Email jane@example.com", &options);
        assert_eq!(first.redacted_text, second.redacted_text);
    }

    #[test]
    fn invalid_policy_is_rejected_at_construction() {
        let mut policy = Policy::default_policy();
        if let Some(entry) = policy.types.get_mut(&PhiType::Name) {
            entry.min_confidence = 5.0;
        }
        let result = Runtime::new().with_policy(policy);
        assert!(result.is_err());
    }
}
