use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation metadata attached to an error when it's logged or reported.
///
/// This never carries document text — only identifiers. `phi-redact-core`
/// stamps one of these with a document id and (for streaming) a session id
/// before handing a `RedactionError` to `tracing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub document_id: Option<String>,
    pub session_id: Option<String>,
    pub trace_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub additional: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            document_id: None,
            session_id: None,
            trace_id: None,
            occurred_at: Utc::now(),
            additional: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Stamps a freshly generated trace id, for a caller that doesn't
    /// already have one propagated from an upstream request.
    pub fn with_generated_trace_id(self) -> Self {
        self.with_trace_id(Uuid::new_v4().to_string())
    }

    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }
}
