//! Error types for the sync primitives

use event_bus::BusError;
use thiserror::Error;

/// Errors raised synchronously, before a wait blocks or an emit is scheduled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Timeout value is negative: {value}")]
    NegativeTimeout { value: i64 },

    #[error("No topics to wait for")]
    NoTopics,

    /// The bus refused the temporary subscription.
    #[error("Failed to register subscription: {0}")]
    Registration(#[from] BusError),

    #[error("No Tokio runtime available to schedule on")]
    NoRuntime,
}

/// Outcome of a scheduled emission that did not complete normally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Event delivery failed: {0}")]
    Delivery(#[from] BusError),

    #[error("Emission was cancelled before it ran")]
    Cancelled,

    #[error("Emission panicked: {0}")]
    Panicked(String),
}
