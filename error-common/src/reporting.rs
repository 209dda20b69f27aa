use crate::context::ErrorContext;
use crate::types::RedactionError;

/// Logs a `RedactionError` through `tracing` with its correlation context.
///
/// The core pipeline is synchronous end to end (see `phi_redact_core`'s
/// crate docs), so this is a plain function rather than an async reporter
/// — there is no I/O here, `tracing`'s subscriber owns any transport.
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn report(error: &RedactionError, ctx: &ErrorContext) {
        tracing::error!(
            category = %error.category(),
            document_id = ctx.document_id.as_deref().unwrap_or(""),
            session_id = ctx.session_id.as_deref().unwrap_or(""),
            trace_id = ctx.trace_id.as_deref().unwrap_or(""),
            occurred_at = %ctx.occurred_at,
            error = %error,
            "redaction error"
        );
    }
}
