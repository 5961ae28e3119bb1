//! # Events
//!
//! Defines the event type that flows through the bus and the topic grammar.
//!
//! An event is a topic plus an ordered map of properties. Topics are
//! `/`-separated tokens, e.g. `org/example/device/STARTED`.

use crate::error::BusError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Property name that always resolves to the event's topic during filtering.
pub const EVENT_TOPIC_PROPERTY: &str = "event.topics";

/// Ordered property map carried by an [`Event`].
pub type Properties = BTreeMap<String, Value>;

/// An immutable event published through the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    topic: String,
    #[serde(default)]
    properties: Properties,
}

impl Event {
    /// Create an event with no properties.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            properties: Properties::new(),
        }
    }

    /// Create an event from a topic and a property map.
    #[must_use]
    pub fn with_properties(topic: impl Into<String>, properties: Properties) -> Self {
        Self {
            topic: topic.into(),
            properties,
        }
    }

    /// Builder-style method to add a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The event topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// All properties, ordered by key.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a property.
    ///
    /// Only explicitly set properties are returned here; the reserved
    /// [`EVENT_TOPIC_PROPERTY`] is resolved by the filter, not stored.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property names in key order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Check that the topic follows the topic grammar.
    pub fn validate(&self) -> Result<(), BusError> {
        validate_topic(&self.topic)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event[topic={}]", self.topic)
    }
}

/// Validate a concrete topic (no wildcards).
///
/// Each `/`-separated token must be non-empty and contain only ASCII
/// alphanumerics, `_` or `-`.
pub fn validate_topic(topic: &str) -> Result<(), BusError> {
    if topic.is_empty() {
        return Err(BusError::InvalidTopic {
            topic: topic.to_string(),
            reason: "topic is empty".to_string(),
        });
    }

    for token in topic.split('/') {
        if token.is_empty() {
            return Err(BusError::InvalidTopic {
                topic: topic.to_string(),
                reason: "empty token".to_string(),
            });
        }
        if let Some(c) = token.chars().find(|c| !is_token_char(*c)) {
            return Err(BusError::InvalidTopic {
                topic: topic.to_string(),
                reason: format!("invalid character '{c}'"),
            });
        }
    }

    Ok(())
}

pub(crate) fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
