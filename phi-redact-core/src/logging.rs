//! Tracing setup: `tracing` for instrumentation, `tracing-subscriber`'s
//! `EnvFilter` for runtime-configurable verbosity.

use tracing_subscriber::EnvFilter;

/// Installs a process-global `tracing` subscriber reading verbosity from
/// `RUST_LOG`, defaulting to `info` when unset. Safe to call once at
/// startup; a second call is a no-op (the underlying `try_init` just
/// returns an error that's intentionally discarded).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
