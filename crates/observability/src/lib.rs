//! Tracing/logging setup shared by hosts and tests.

/// Initialize process-wide logging (JSON, `RUST_LOG`, default `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use tracing::{init_test, init_with};
