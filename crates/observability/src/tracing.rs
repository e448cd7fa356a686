//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// JSON logs with timestamps, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(DEFAULT_DIRECTIVE);
}

/// Like [`init`], with a different fallback filter when `RUST_LOG` is unset.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_with(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Human-readable logs routed through the test harness' captured output.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("debug"))
        .compact()
        .with_test_writer()
        .try_init();
}
