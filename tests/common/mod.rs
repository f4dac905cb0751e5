// tests/common/mod.rs
//! Shared helpers for integration tests

use tracing_subscriber::{fmt, EnvFilter};

/// Install a test-writer subscriber when `RUST_LOG` is set. Returns whether
/// logging was requested. Safe to call from every test.
pub fn init_tracing() -> bool {
    if std::env::var_os("RUST_LOG").is_none() {
        return false;
    }
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    true
}
