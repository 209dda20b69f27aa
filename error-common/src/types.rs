use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed error taxonomy for the redaction engine.
///
/// Configuration and invariant failures are fatal: a caller must never treat
/// a `RedactionError` as a partially-successful redaction. Detector-level
/// unavailability is the one variant the pipeline itself recovers from —
/// everything else bubbles up uncaught.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum RedactionError {
    /// Invalid policy, unknown PHI type, or malformed threshold/feature/
    /// calibration/post-filter configuration. Surfaced at load time; the
    /// process must refuse to run rather than merge a partial config.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A detector's backing resource (dictionary, model) could not be
    /// loaded. Downgrades that detector to empty output with a warning in
    /// the audit report; does not abort redaction.
    #[error("detector '{detector}' unavailable: {reason}")]
    DetectorUnavailable { detector: String, reason: String },

    /// A dictionary file was present but malformed. `Config` if this is
    /// hit during eager load; this variant covers lazy load at call time.
    #[error("dictionary '{path}' invalid: {reason}")]
    DictionaryInvalid { path: String, reason: String },

    /// The reconciler produced overlapping applied spans, or the applier
    /// was handed unsorted/overlapping input. Fatal in debug builds;
    /// release builds coalesce the offending spans and log this error.
    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    /// A single `redact` call exceeded the configured byte cap. No partial
    /// result is produced.
    #[error("input of {actual} bytes exceeds the {limit} byte cap")]
    InputTooLarge { limit: usize, actual: usize },

    /// A streaming session hit an ambiguous boundary state (e.g. `flush`
    /// called mid-entity). Carried as a warning on the segment's audit;
    /// a best-effort redaction is still applied.
    #[error("streaming boundary ambiguity: {message}")]
    StreamingBoundary { message: String },

    /// Defensive catch-all for failures that don't fit the taxonomy above.
    /// A growing count of this variant in production is itself a bug.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RedactionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn detector_unavailable(detector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DetectorUnavailable {
            detector: detector.into(),
            reason: reason.into(),
        }
    }

    pub fn dictionary_invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DictionaryInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn input_too_large(limit: usize, actual: usize) -> Self {
        Self::InputTooLarge { limit, actual }
    }

    pub fn streaming_boundary(message: impl Into<String>) -> Self {
        Self::StreamingBoundary {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Category tag, stable across variants, useful for metrics labels
    /// without exposing the (potentially detailed) message text.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Config,
            Self::DetectorUnavailable { .. } => ErrorCategory::DetectorUnavailable,
            Self::DictionaryInvalid { .. } => ErrorCategory::DictionaryInvalid,
            Self::InvariantViolation { .. } => ErrorCategory::InvariantViolation,
            Self::InputTooLarge { .. } => ErrorCategory::InputTooLarge,
            Self::StreamingBoundary { .. } => ErrorCategory::StreamingBoundary,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether the pipeline may continue in a degraded mode (detector
    /// failure) rather than aborting the whole call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DetectorUnavailable { .. })
    }

    /// Whether this must hard-abort the process in debug builds per the
    /// reconciler/applier invariant contract.
    pub fn is_fatal_in_debug(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Config,
    DetectorUnavailable,
    DictionaryInvalid,
    InvariantViolation,
    InputTooLarge,
    StreamingBoundary,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::DetectorUnavailable => "detector_unavailable",
            Self::DictionaryInvalid => "dictionary_invalid",
            Self::InvariantViolation => "invariant_violation",
            Self::InputTooLarge => "input_too_large",
            Self::StreamingBoundary => "streaming_boundary",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Result alias used throughout the redaction engine.
pub type RedactionResult<T> = Result<T, RedactionError>;
