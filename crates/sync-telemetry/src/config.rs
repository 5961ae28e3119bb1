//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `event_sync=debug,info`
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Route output through the libtest capture writer
    pub test_writer: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "event-sync".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            test_writer: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EVSYNC_SERVICE_NAME`: Service name (default: event-sync)
    /// - `EVSYNC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `EVSYNC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `EVSYNC_JSON_LOGS`: Enable JSON logs (default: false, true in CI)
    pub fn from_env() -> Self {
        let is_ci = env::var("CI").is_ok();

        Self {
            service_name: env::var("EVSYNC_SERVICE_NAME")
                .unwrap_or_else(|_| "event-sync".to_string()),

            log_level: env::var("EVSYNC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("EVSYNC_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("EVSYNC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_ci),

            test_writer: false,
        }
    }

    /// Configuration for test binaries: debug output captured per test.
    pub fn for_tests() -> Self {
        let mut config = Self::from_env();
        if env::var("EVSYNC_LOG_LEVEL").is_err() && env::var("RUST_LOG").is_err() {
            config.log_level = "debug".to_string();
        }
        config.json_logs = false;
        config.test_writer = true;
        config
    }

    /// Builder-style method to set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}
