//! ReplacementApplier (§4.7): a single left-to-right pass that substitutes
//! every accepted span's replacement text, producing the final redacted
//! document plus an offset map from original to redacted code points.

use crate::document::Document;
use crate::policy::{Policy, ReplacementStyle};
use crate::span::Span;

/// Maps an original-document code-point offset to its position in the
/// redacted output. Built once per [`ReplacementApplier::apply`] call.
#[derive(Debug, Clone)]
pub struct RedactedOffsetMap {
    /// Parallel to the original document's code points plus one trailing
    /// sentinel; `redacted_for_original[i]` is where original offset `i`
    /// lands in the redacted text.
    redacted_for_original: Vec<usize>,
}

impl RedactedOffsetMap {
    pub fn map(&self, original_offset: usize) -> usize {
        match self.redacted_for_original.get(original_offset) {
            Some(mapped) => *mapped,
            None => self.redacted_for_original.last().copied().unwrap_or(0),
        }
    }
}

pub struct AppliedResult {
    pub redacted_text: String,
    pub offset_map: RedactedOffsetMap,
    pub spans: Vec<Span>,
}

pub struct ReplacementApplier<'a> {
    policy: &'a Policy,
}

impl<'a> ReplacementApplier<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    /// `spans` must already be sorted by `start` and non-overlapping — the
    /// reconciler's output satisfies both. Spans that fail to resolve a
    /// replacement (shouldn't happen given reconciled input, but guarded
    /// rather than indexed unchecked) are marked `unreplaced` and copied
    /// through verbatim.
    pub fn apply(&self, document: &Document, mut spans: Vec<Span>) -> AppliedResult {
        let mut redacted = String::new();
        let mut redacted_for_original = Vec::with_capacity(document.len() + 1);
        let mut cursor = 0usize;

        spans.sort_by_key(|span| span.start());

        for span in &mut spans {
            let start = span.start();
            let end = span.end();
            if start < cursor || end > document.len() {
                span.unreplaced = true;
                continue;
            }

            // Copy the untouched gap before this span, one offset entry per
            // original code point so `redacted_for_original` stays aligned.
            if let Ok(gap) = document.slice(cursor, start) {
                let mut running = redacted.chars().count();
                for _ in cursor..start {
                    redacted_for_original.push(running);
                    running += 1;
                }
                redacted.push_str(gap);
            }

            let replacement = self.render_replacement(span);
            let replacement_start_in_output = redacted.chars().count();
            redacted.push_str(&replacement);

            for _ in start..end {
                redacted_for_original.push(replacement_start_in_output);
            }

            span.applied = true;
            span.replacement = Some(replacement);
            cursor = end;
        }

        if let Ok(tail) = document.slice(cursor, document.len()) {
            let mut running = redacted.chars().count();
            redacted.push_str(tail);
            for _ in cursor..document.len() {
                redacted_for_original.push(running);
                running += 1;
            }
        }
        redacted_for_original.push(redacted.chars().count());

        AppliedResult {
            redacted_text: redacted,
            offset_map: RedactedOffsetMap { redacted_for_original },
            spans,
        }
    }

    fn render_replacement(&self, span: &Span) -> String {
        let entry = self.policy.entry(span.phi_type());
        if let Some(template) = &entry.replacement_template {
            return template.replace("{}", span.phi_type().as_str());
        }

        match self.policy.replacement_style {
            ReplacementStyle::Brackets => format!("[{}]", span.phi_type()),
            ReplacementStyle::Asterisks => "*".repeat(span.candidate.len().max(1)),
            ReplacementStyle::Empty => String::new(),
            ReplacementStyle::Token => format!("{{{}}}", span.phi_type()),
        }
    }
}
