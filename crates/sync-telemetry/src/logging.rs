//! Log setup helpers for test binaries.

use std::sync::OnceLock;

use crate::{tracing_setup, TelemetryConfig, TelemetryError};

static TEST_TRACING: OnceLock<()> = OnceLock::new();

/// Install a test-writer subscriber once per process.
///
/// Safe to call from every test; only the first call does any work. If a
/// different subscriber is already installed it is left in place.
pub fn init_test_tracing() {
    TEST_TRACING.get_or_init(|| {
        match tracing_setup::init_tracing(&TelemetryConfig::for_tests()) {
            Ok(()) | Err(TelemetryError::AlreadyInitialized(_)) => {}
            Err(e) => eprintln!("Test tracing not initialized: {e}"),
        }
    });
}
