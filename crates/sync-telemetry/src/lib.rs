//! # Sync Telemetry
//!
//! Log setup for event-sync users and test binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     init_tracing(&TelemetryConfig::from_env()).expect("Failed to init tracing");
//!     // Waiter and dispatcher logs are now emitted
//! }
//! ```
//!
//! In tests, call [`init_test_tracing`] at the top of each test.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EVSYNC_SERVICE_NAME` | `event-sync` | Service name in the startup log |
//! | `EVSYNC_LOG_LEVEL` | `info` | Log level / `EnvFilter` directive |
//! | `EVSYNC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `EVSYNC_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::init_test_tracing;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

