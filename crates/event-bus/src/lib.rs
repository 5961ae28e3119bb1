//! # Event Bus - Topic/Filter Publish-Subscribe
//!
//! The bus that the event-sync primitives are built on.
//!
//! ## Model
//!
//! ```text
//! ┌──────────────┐   post() / send()   ┌──────────────┐
//! │   Emitter    │ ──────────────────► │  Event Bus   │
//! └──────────────┘                     │              │
//!                                      │  topic match │
//!                                      │  + filter    │
//! ┌──────────────┐   handle_event()    │              │
//! │  Subscriber  │ ◄────────────────── │              │
//! └──────────────┘                     └──────────────┘
//! ```
//!
//! - **Topics** are `/`-separated (`org/example/ping`); subscribers use
//!   exact topics, `prefix/*` or `*`.
//! - **Filters** are LDAP-style expressions over event properties, e.g.
//!   `(&(P>=5)(name=alpha*))`.
//! - **Post** delivers asynchronously on the bus's delivery worker;
//!   **send** delivers on the caller's thread.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod events;
pub mod filter;
pub mod publisher;
pub mod subscriber;
pub mod topic;

// Re-export main types
pub use error::{BusError, FilterError};
pub use events::{validate_topic, Event, Properties, EVENT_TOPIC_PROPERTY};
pub use filter::{CompareOp, Filter};
pub use publisher::{EventBus, InMemoryEventBus};
pub use subscriber::{EventHandler, EventMatcher, SubscriptionId, SubscriptionSpec};
pub use topic::TopicPattern;

/// Topic pattern matching every topic.
pub const ALL_TOPICS: &str = "*";
