//! Tracing bootstrap for binaries, demos, and tests.

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber honoring `RUST_LOG`.
///
/// Defaults to `info` for this crate when no filter is set. Idempotent:
/// a second call is a no-op if a global subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flowsync=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
