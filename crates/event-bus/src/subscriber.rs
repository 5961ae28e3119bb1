//! # Event Subscriber
//!
//! Defines the subscription side of the event bus: what a subscriber wants
//! (`SubscriptionSpec`) and how it is called back (`EventHandler`).

use crate::error::BusError;
use crate::events::Event;
use crate::filter::Filter;
use crate::topic::TopicPattern;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Callback invoked by the bus for every matching event.
///
/// Runs on whatever thread the bus delivers on: the delivery worker for
/// posted events, the sender's thread for sent events. Implementations
/// should return quickly.
pub trait EventHandler: Send + Sync {
    /// Handle one delivered event.
    fn handle_event(&self, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle_event(&self, event: &Event) {
        self(event)
    }
}

/// What a subscriber wants to receive: one or more topic patterns
/// (logical OR) and an optional property filter.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSpec {
    /// Raw topic patterns.
    pub topics: Vec<String>,
    /// Raw filter expression.
    pub filter: Option<String>,
}

impl SubscriptionSpec {
    /// Subscribe to a single topic pattern.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
            filter: None,
        }
    }

    /// Subscribe to several topic patterns.
    #[must_use]
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            filter: None,
        }
    }

    /// Builder-style method to set the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Parse the patterns and filter into a matcher.
    pub fn compile(&self) -> Result<EventMatcher, BusError> {
        if self.topics.is_empty() {
            return Err(BusError::NoTopics);
        }

        let patterns = self
            .topics
            .iter()
            .map(|t| TopicPattern::parse(t))
            .collect::<Result<Vec<_>, _>>()?;

        let filter = self.filter.as_deref().map(Filter::parse).transpose()?;

        Ok(EventMatcher { patterns, filter })
    }
}

/// Compiled form of a [`SubscriptionSpec`].
#[derive(Debug, Clone)]
pub struct EventMatcher {
    patterns: Vec<TopicPattern>,
    filter: Option<Filter>,
}

impl EventMatcher {
    /// Check if an event matches any pattern and the filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.patterns.iter().any(|p| p.matches(event.topic()))
            && self.filter.as_ref().map_or(true, |f| f.matches(event))
    }

    /// The compiled topic patterns.
    #[must_use]
    pub fn patterns(&self) -> &[TopicPattern] {
        &self.patterns
    }
}
