//! tracing subscriber setup shared by binaries and integration tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatted subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when several tests call this in one process.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok()
}

/// Subscriber for tests: output captured by the test harness.
pub fn init_test_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
