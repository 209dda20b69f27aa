//! Shared error taxonomy for the redaction engine.
//!
//! Every fallible boundary in `phi-redact-core` returns a [`RedactionError`]
//! drawn from this closed set. Detector-level failures never reach here —
//! they're contained at the registry and reported as metadata on the result
//! instead (see the crate-level docs on `phi_redact_core::detectors`).
//!
//! # Example
//!
//! ```rust
//! use error_common::{RedactionError, ErrorContext};
//!
//! fn load_thresholds(raw: &str) -> Result<(), RedactionError> {
//!     if raw.trim().is_empty() {
//!         return Err(RedactionError::config("thresholds file is empty"));
//!     }
//!     Ok(())
//! }
//!
//! let ctx = ErrorContext::new().with_document_id("doc-42");
//! if let Err(e) = load_thresholds("") {
//!     tracing::warn!(document_id = ?ctx.document_id, error = %e, "rejecting config");
//! }
//! ```

pub mod context;
pub mod reporting;
pub mod sanitization;
pub mod types;

pub use context::*;
pub use reporting::*;
pub use sanitization::*;
pub use types::*;
