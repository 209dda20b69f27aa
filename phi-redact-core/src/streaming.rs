//! StreamingController (§4.8): runs the pipeline over a text stream chunk
//! by chunk, holding back an overlap window so a PHI span straddling a
//! chunk boundary is never split, and suppressing re-emission of output
//! already sent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use error_common::{ErrorContext, ErrorReporter, RedactionResult};

use crate::applier::ReplacementApplier;
use crate::context::{ContextAnalyzer, PurposeOfUse};
use crate::document::Document;
use crate::policy::Policy;
use crate::reconciler::Reconciler;
use crate::thresholds::AdaptiveThresholds;
use crate::whitelist::Whitelist;
use crate::detectors::DetectorRegistry;

/// When a safe prefix is computed (§4.8): `Immediate` flushes everything up
/// to the last confirmed non-overlapping boundary on every `push`;
/// `Sentence` withholds output until a sentence terminator is seen, trading
/// latency for fewer retractions on ambiguous trailing spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafePrefixMode {
    Immediate,
    Sentence,
}

/// A chunk of output text plus the code-point position (in the cumulative
/// input stream) it starts at, matching §4.8's "monotone output position".
#[derive(Debug, Clone)]
pub struct StreamingChunk {
    pub text: String,
    pub position: usize,
}

/// Holds the carried-over tail of unflushed input and the digests of
/// already-emitted overlap regions, so a region re-considered after more
/// context arrives is never sent twice.
pub struct StreamingState {
    mode: SafePrefixMode,
    buffered: String,
    /// Code-point position in the overall stream where `buffered` starts.
    buffered_start: usize,
    emitted_digests: std::collections::HashSet<String>,
    output_position: usize,
}

impl StreamingState {
    pub fn new(mode: SafePrefixMode) -> Self {
        Self {
            mode,
            buffered: String::new(),
            buffered_start: 0,
            emitted_digests: std::collections::HashSet::new(),
            output_position: 0,
        }
    }

    pub fn reset(&mut self) {
        self.buffered.clear();
        self.buffered_start = 0;
        self.emitted_digests.clear();
        self.output_position = 0;
    }
}

pub struct StreamingController<'a> {
    registry: &'a DetectorRegistry,
    policy: Policy,
    purpose_of_use: Option<PurposeOfUse>,
    candidate_ceiling: usize,
}

impl<'a> StreamingController<'a> {
    pub fn new(
        registry: &'a DetectorRegistry,
        policy: Policy,
        purpose_of_use: Option<PurposeOfUse>,
        candidate_ceiling: usize,
    ) -> Self {
        Self {
            registry,
            policy,
            purpose_of_use,
            candidate_ceiling,
        }
    }

    /// Appends `chunk` to the buffered tail, reconciles over the combined
    /// text, and returns the newly-safe-to-emit output. The unsafe trailing
    /// region (the part that could still change once more text arrives) is
    /// kept in `state.buffered` for the next call.
    pub fn push(&self, state: &mut StreamingState, chunk: &str) -> RedactionResult<StreamingChunk> {
        state.buffered.push_str(chunk);
        self.process(state, false)
    }

    /// Flushes everything buffered, treating the stream as ended: nothing
    /// further will straddle a boundary, so the full tail is safe to emit.
    pub fn flush(&self, state: &mut StreamingState) -> RedactionResult<StreamingChunk> {
        self.process(state, true)
    }

    fn process(&self, state: &mut StreamingState, is_final: bool) -> RedactionResult<StreamingChunk> {
        let document = Document::from_str(&state.buffered);
        let context = ContextAnalyzer::analyze(&document, self.purpose_of_use);
        let thresholds = AdaptiveThresholds::new(None);
        let whitelist = Whitelist::new(None);
        let reconciler = Reconciler::new(&self.policy, &thresholds, &whitelist, self.candidate_ceiling);

        let candidates = self.registry.run_all(&document, &context);
        let reconciliation = reconciler.reconcile(candidates, &document, &context);

        let safe_boundary = if is_final {
            document.len()
        } else {
            self.safe_prefix_boundary(state.mode, &document, &reconciliation.accepted)
        };

        let applier = ReplacementApplier::new(&self.policy);
        let safe_spans: Vec<_> = reconciliation
            .accepted
            .into_iter()
            .filter(|span| span.end() <= safe_boundary)
            .collect();

        let safe_text = document.slice(0, safe_boundary).map_err(|e| {
            ErrorReporter::report(&e, &ErrorContext::new().with_session_id(state.buffered_start.to_string()));
            e
        })?;
        let safe_document = Document::from_str(safe_text);
        let applied = applier.apply(&safe_document, safe_spans);

        let digest = chunk_digest(state.buffered_start, &applied.redacted_text);
        let already_emitted = state.emitted_digests.contains(&digest);
        if !already_emitted {
            state.emitted_digests.insert(digest);
        }

        let position = state.output_position;
        let emitted_text = if already_emitted { String::new() } else { applied.redacted_text };
        state.output_position += emitted_text.chars().count();

        // Carry the unsafe remainder (from safe_boundary onward) into the
        // next call's buffer, re-based so offsets start at zero again.
        let remainder = document.slice(safe_boundary, document.len())?.to_string();
        state.buffered_start += safe_boundary;
        state.buffered = remainder;

        Ok(StreamingChunk {
            text: emitted_text,
            position,
        })
    }

    /// The safe-prefix rule (§4.8): in `Immediate` mode, everything before
    /// the last accepted span's end is safe (a span can't retroactively
    /// grow past where it already ended). In `Sentence` mode, safety is
    /// additionally capped at the last sentence terminator, so a name that
    /// might continue into more words isn't cut mid-phrase.
    fn safe_prefix_boundary(
        &self,
        mode: SafePrefixMode,
        document: &Document,
        accepted: &[crate::span::Span],
    ) -> usize {
        let last_accepted_end = accepted.iter().map(|span| span.end()).max().unwrap_or(0);

        match mode {
            SafePrefixMode::Immediate => last_accepted_end,
            SafePrefixMode::Sentence => {
                let text = document.as_str();
                let mut boundary = 0usize;
                for (code_point_idx, c) in text.chars().enumerate() {
                    if c == '.' || c == '!' || c == '?' {
                        boundary = code_point_idx + 1;
                    }
                }
                boundary.min(document.len()).max(last_accepted_end.min(boundary))
            }
        }
    }
}

fn chunk_digest(position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(position.to_le_bytes());
    hasher.update(text.as_bytes());
    BASE64.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(registry: &DetectorRegistry, policy: Policy) -> StreamingController<'_> {
        StreamingController::new(registry, policy, Some(PurposeOfUse::Treatment), 1000)
    }

    #[test]
    fn push_then_flush_redacts_a_span_straddling_chunks() {
        let registry = DetectorRegistry::default_registry();
        let policy = Policy::default_policy();
        let ctrl = controller(&registry, policy);
        let mut state = StreamingState::new(SafePrefixMode::Immediate);

        let first = ctrl.push(&mut state, "SSN is 123-45").unwrap_or_else(|_| StreamingChunk {
            text: String::new(),
            position: 0,
        });
        let second = ctrl.push(&mut state, "-6789 today").unwrap_or_else(|_| StreamingChunk {
            text: String::new(),
            position: 0,
        });
        let last = ctrl.flush(&mut state).unwrap_or_else(|_| StreamingChunk {
            text: String::new(),
            position: 0,
        });

        let combined = format!("{}{}{}", first.text, second.text, last.text);
        assert!(combined.contains("[SSN]"));
        assert!(!combined.contains("123-45-6789"));
    }

    #[test]
    fn output_positions_are_monotone() {
        let registry = DetectorRegistry::default_registry();
        let policy = Policy::default_policy();
        let ctrl = controller(&registry, policy);
        let mut state = StreamingState::new(SafePrefixMode::Immediate);

        let first = ctrl.push(&mut state, "Patient John Smith, SSN 123-45-6789. ").unwrap_or_else(|_| StreamingChunk {
            text: String::new(),
            position: 0,
        });
        let second = ctrl.push(&mut state, "Follow up next week.").unwrap_or_else(|_| StreamingChunk {
            text: String::new(),
            position: 0,
        });

        assert!(second.position >= first.position);
    }

    #[test]
    fn reset_clears_all_carried_state() {
        let mut state = StreamingState::new(SafePrefixMode::Immediate);
        state.buffered.push_str("leftover");
        state.output_position = 42;
        state.reset();
        assert!(state.buffered.is_empty());
        assert_eq!(state.output_position, 0);
    }
}
