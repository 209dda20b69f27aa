//! RedactionReport (§6): the audit-facing summary returned alongside the
//! redacted text — per-type counts, what got dropped and why, the
//! normalization/context signals that fed the thresholds, and timing.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{DocumentType, PurposeOfUse, RedactionContext, Specialty};
use crate::normalize::NormalizationSignals;
use crate::span::{DroppedCandidate, PhiType, Span};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub normalize: Duration,
    pub detect: Duration,
    pub reconcile: Duration,
    pub apply: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSignals {
    pub document_type: DocumentType,
    pub specialty: Specialty,
    pub purpose_of_use: PurposeOfUse,
    pub chaos_score: f32,
    pub ocr_suspected: bool,
}

impl From<&RedactionContext> for ContextSignals {
    fn from(context: &RedactionContext) -> Self {
        Self {
            document_type: context.document_type,
            specialty: context.specialty,
            purpose_of_use: context.purpose_of_use,
            chaos_score: context.chaos_score,
            ocr_suspected: context.ocr_suspected,
        }
    }
}

/// Full audit trail for one `redact` call (§6, §8 scenario 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionReport {
    /// Unique identifier for this call, so a downstream audit log can
    /// correlate a report with the request that produced it.
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub redacted_text: String,
    pub counts_by_type: HashMap<PhiType, usize>,
    pub applied_spans: Vec<Span>,
    pub dropped_candidates: Vec<DroppedCandidate>,
    pub normalization_signals: NormalizationSignals,
    pub context_signals: ContextSignals,
    #[serde(skip)]
    pub timings: StageTimings,
}

impl RedactionReport {
    pub fn build(
        redacted_text: String,
        applied_spans: Vec<Span>,
        dropped_candidates: Vec<DroppedCandidate>,
        normalization_signals: NormalizationSignals,
        context: &RedactionContext,
        timings: StageTimings,
    ) -> Self {
        let counts_by_type = applied_spans.iter().map(|span| span.phi_type()).counts();

        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            redacted_text,
            counts_by_type,
            applied_spans,
            dropped_candidates,
            normalization_signals,
            context_signals: ContextSignals::from(context),
            timings,
        }
    }

    pub fn total_redacted(&self) -> usize {
        self.applied_spans.len()
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped_candidates.len()
    }
}
