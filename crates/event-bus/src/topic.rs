//! # Topic Patterns
//!
//! A subscriber names the topics it wants with patterns:
//!
//! - `org/example/ping` matches exactly that topic
//! - `org/example/*` matches every topic below `org/example`
//! - `*` matches every topic

use crate::error::BusError;
use crate::events::validate_topic;
use std::fmt;
use std::str::FromStr;

/// A parsed topic pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicPattern {
    /// Matches every topic.
    All,
    /// Matches one topic exactly.
    Exact(String),
    /// Matches topics strictly below the stored prefix.
    Prefix(String),
}

impl TopicPattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, BusError> {
        let invalid = || BusError::InvalidPattern {
            pattern: pattern.to_string(),
        };

        if pattern == "*" {
            return Ok(Self::All);
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            validate_topic(prefix).map_err(|_| invalid())?;
            return Ok(Self::Prefix(prefix.to_string()));
        }

        validate_topic(pattern).map_err(|_| invalid())?;
        Ok(Self::Exact(pattern.to_string()))
    }

    /// Check whether a concrete topic matches this pattern.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(exact) => exact == topic,
            Self::Prefix(prefix) => topic
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/')),
        }
    }
}

impl FromStr for TopicPattern {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Exact(topic) => f.write_str(topic),
            Self::Prefix(prefix) => write!(f, "{prefix}/*"),
        }
    }
}
