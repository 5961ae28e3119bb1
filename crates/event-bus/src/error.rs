//! Error types for the event bus

use crate::subscriber::SubscriptionId;
use thiserror::Error;

/// Errors returned by [`EventBus`](crate::EventBus) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus was closed.
    #[error("Event bus closed")]
    Closed,

    #[error("Invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("Invalid topic pattern '{pattern}'")]
    InvalidPattern { pattern: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    /// A subscription needs at least one topic pattern.
    #[error("Subscription has no topics")]
    NoTopics,
}

/// Errors from parsing a filter expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unexpected end of filter")]
    UnexpectedEnd,

    #[error("Unexpected '{found}' at {pos}, expected {expected}")]
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },

    #[error("Empty attribute name at {pos}")]
    EmptyAttribute { pos: usize },

    #[error("Trailing input at {pos}")]
    TrailingInput { pos: usize },
}
