//! # Event Sync
//!
//! Test-side synchronization over an [`EventBus`](event_bus::EventBus):
//!
//! - **Event Waiter** ([`wait_for_event`]): subscribe temporarily, wait for
//!   the first matching event or a timeout, always unsubscribe.
//! - **Delayed Dispatcher** ([`schedule_emit`]): post or send one event after
//!   a delay without blocking the caller.
//!
//! ## Usage
//!
//! ```ignore
//! use event_bus::{Event, InMemoryEventBus};
//! use event_sync::{post_event, wait_for_event, WaitOptions};
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let handle = post_event(bus.clone(), Event::new("ping"), 50)?;
//!
//! let event = wait_for_event(&*bus, &WaitOptions::topic("ping").timeout_millis(500)).await?;
//! assert_eq!(event.map(|e| e.topic().to_string()).as_deref(), Some("ping"));
//! handle.await?;
//! ```
//!
//! ## Outcomes
//!
//! | Situation | `wait_for_event` | `EmitHandle` |
//! |-----------|------------------|--------------|
//! | Success | `Ok(Some(event))` | `Ok(())` |
//! | Timeout / interrupt | `Ok(None)` | - |
//! | Bad input / bus refuses | `Err(SyncError)` | `Err(SyncError)` at scheduling |
//! | Bus fails while emitting | - | `Err(DispatchError::Delivery)` |

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod waiter;

pub use config::{DeliveryMode, EmitOptions, TimeUnit, WaitOptions};
pub use dispatcher::{post_event, schedule_emit, send_event, EmitHandle};
pub use error::{DispatchError, SyncError};
pub use waiter::{wait_for_event, SubscriptionGuard, WaitInterrupt};

// Re-export the bus types callers need alongside the primitives
pub use event_bus::{Event, EventBus};
