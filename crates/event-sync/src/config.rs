//! Wait and emit options
//!
//! One options struct per primitive instead of a signature per combination
//! of topic(s), filter, timeout and unit.
//!
//! # Example
//!
//! ```ignore
//! use event_sync::{EmitOptions, TimeUnit, WaitOptions};
//!
//! let wait = WaitOptions::topics(["topic/A", "topic/B"])
//!     .filter("(P>=5)")
//!     .timeout(500, TimeUnit::Milliseconds);
//!
//! let emit = EmitOptions::send(2, TimeUnit::Seconds);
//! ```

use crate::error::SyncError;
use crate::waiter::WaitInterrupt;
use event_bus::SubscriptionSpec;
use std::time::Duration;

/// Unit for timeout and delay values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Convert `value` of this unit to a `Duration`, saturating on overflow.
    #[must_use]
    pub fn to_duration(self, value: u64) -> Duration {
        match self {
            Self::Nanoseconds => Duration::from_nanos(value),
            Self::Microseconds => Duration::from_micros(value),
            Self::Milliseconds => Duration::from_millis(value),
            Self::Seconds => Duration::from_secs(value),
            Self::Minutes => Duration::from_secs(value.saturating_mul(60)),
            Self::Hours => Duration::from_secs(value.saturating_mul(3_600)),
            Self::Days => Duration::from_secs(value.saturating_mul(86_400)),
        }
    }
}

/// How a scheduled event is handed to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryMode {
    /// Non-blocking delivery (`EventBus::post`).
    #[default]
    Post,
    /// Blocking delivery (`EventBus::send`).
    Send,
}

/// Options for [`wait_for_event`](crate::wait_for_event).
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    /// Topic patterns; any of them may match.
    pub topics: Vec<String>,

    /// Optional LDAP-style property filter.
    pub filter: Option<String>,

    /// Timeout value. `0` waits indefinitely; negative values are rejected.
    pub timeout: i64,

    /// Unit of `timeout`.
    pub unit: TimeUnit,

    /// Optional external interruption signal.
    pub interrupt: Option<WaitInterrupt>,
}

impl WaitOptions {
    /// Wait on a single topic pattern, indefinitely.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
            ..Self::default()
        }
    }

    /// Wait on any of several topic patterns, indefinitely.
    #[must_use]
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Only capture events whose properties match `filter`.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the timeout. `0` means wait indefinitely.
    #[must_use]
    pub fn timeout(mut self, value: i64, unit: TimeUnit) -> Self {
        self.timeout = value;
        self.unit = unit;
        self
    }

    /// Set the timeout in milliseconds. `0` means wait indefinitely.
    #[must_use]
    pub fn timeout_millis(self, value: i64) -> Self {
        self.timeout(value, TimeUnit::Milliseconds)
    }

    /// Let `interrupt` end the wait early.
    #[must_use]
    pub fn interrupt(mut self, interrupt: &WaitInterrupt) -> Self {
        self.interrupt = Some(interrupt.clone());
        self
    }

    /// Check the inputs and resolve the deadline.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(duration))` - bounded wait
    /// - `Ok(None)` - unbounded wait (`timeout == 0`)
    pub fn validate(&self) -> Result<Option<Duration>, SyncError> {
        if self.timeout < 0 {
            return Err(SyncError::NegativeTimeout {
                value: self.timeout,
            });
        }
        if self.topics.is_empty() {
            return Err(SyncError::NoTopics);
        }

        Ok(match self.timeout.unsigned_abs() {
            0 => None,
            value => Some(self.unit.to_duration(value)),
        })
    }

    /// The subscription this wait registers.
    #[must_use]
    pub fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec {
            topics: self.topics.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// Options for [`schedule_emit`](crate::schedule_emit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitOptions {
    /// Delay before emitting, measured from the scheduling call.
    pub delay: u64,

    /// Unit of `delay`.
    pub unit: TimeUnit,

    /// Post or send.
    pub mode: DeliveryMode,
}

impl EmitOptions {
    /// Post after `delay`.
    #[must_use]
    pub fn post(delay: u64, unit: TimeUnit) -> Self {
        Self {
            delay,
            unit,
            mode: DeliveryMode::Post,
        }
    }

    /// Send after `delay`.
    #[must_use]
    pub fn send(delay: u64, unit: TimeUnit) -> Self {
        Self {
            delay,
            unit,
            mode: DeliveryMode::Send,
        }
    }

    #[must_use]
    pub fn post_after_millis(delay: u64) -> Self {
        Self::post(delay, TimeUnit::Milliseconds)
    }

    #[must_use]
    pub fn send_after_millis(delay: u64) -> Self {
        Self::send(delay, TimeUnit::Milliseconds)
    }

    /// The delay as a `Duration`.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.unit.to_duration(self.delay)
    }
}
