//! # Event Publisher
//!
//! Defines the `EventBus` interface and its in-memory implementation.
//!
//! ## Delivery Model
//!
//! - `post()` enqueues the event and returns immediately. A single delivery
//!   worker thread drains the queue, so posted events reach subscribers in
//!   the order they were posted.
//! - `send()` delivers on the caller's thread and returns once every
//!   matching handler has run.

use crate::error::BusError;
use crate::events::Event;
use crate::subscriber::{EventHandler, EventMatcher, SubscriptionId, SubscriptionSpec};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Name of the thread that delivers posted events.
pub const DELIVERY_THREAD_NAME: &str = "event-bus-delivery";

/// Publish/subscribe interface consumed by the sync primitives.
pub trait EventBus: Send + Sync {
    /// Deliver asynchronously. Returns before subscribers run.
    fn post(&self, event: Event) -> Result<(), BusError>;

    /// Deliver synchronously.
    ///
    /// # Returns
    ///
    /// The number of handlers that received the event.
    fn send(&self, event: Event) -> Result<usize, BusError>;

    /// Register a handler for events matching `spec`.
    fn subscribe(
        &self,
        spec: SubscriptionSpec,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionId, BusError>;

    /// Remove a registration.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError>;

    /// Number of live registrations.
    fn subscriber_count(&self) -> usize;
}

impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    fn post(&self, event: Event) -> Result<(), BusError> {
        (**self).post(event)
    }

    fn send(&self, event: Event) -> Result<usize, BusError> {
        (**self).send(event)
    }

    fn subscribe(
        &self,
        spec: SubscriptionSpec,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionId, BusError> {
        (**self).subscribe(spec, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        (**self).unsubscribe(id)
    }

    fn subscriber_count(&self) -> usize {
        (**self).subscriber_count()
    }
}

struct Registration {
    matcher: EventMatcher,
    handler: Arc<dyn EventHandler>,
}

/// Subscription table shared with the delivery worker.
#[derive(Default)]
struct Registry {
    subscriptions: RwLock<HashMap<SubscriptionId, Registration>>,
    closed: AtomicBool,
}

impl Registry {
    /// Snapshot the matching handlers so none run under the lock.
    fn matching(&self, event: &Event) -> Vec<Arc<dyn EventHandler>> {
        self.subscriptions
            .read()
            .values()
            .filter(|r| r.matcher.matches(event))
            .map(|r| r.handler.clone())
            .collect()
    }

    fn deliver_isolated(&self, event: &Event) {
        for handler in self.matching(event) {
            let result = catch_unwind(AssertUnwindSafe(|| handler.handle_event(event)));
            if result.is_err() {
                warn!(topic = event.topic(), "Event handler panicked during post delivery");
            }
        }
    }
}

/// In-memory implementation of the event bus.
///
/// Suitable for tests and single-process use. Dropping the bus stops the
/// delivery worker once the queue is drained.
pub struct InMemoryEventBus {
    registry: Arc<Registry>,

    /// Queue feeding the delivery worker; `None` if the worker failed to start.
    queue: Option<mpsc::UnboundedSender<Event>>,

    next_id: AtomicU64,

    events_published: AtomicU64,
}

impl InMemoryEventBus {
    /// Create a bus and start its delivery worker.
    #[must_use]
    pub fn new() -> Self {
        let registry = Arc::new(Registry::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let worker_registry = registry.clone();
        let spawned = thread::Builder::new()
            .name(DELIVERY_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(event) = rx.blocking_recv() {
                    worker_registry.deliver_isolated(&event);
                }
                debug!("Event bus delivery worker stopped");
            });

        let queue = match spawned {
            Ok(_) => Some(tx),
            Err(e) => {
                error!(error = %e, "Failed to start delivery worker, posting will deliver inline");
                None
            }
        };

        Self {
            registry,
            queue,
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
        }
    }

    /// Total events accepted by `post` and `send`.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Whether `close()` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.registry.closed.load(Ordering::Acquire)
    }

    /// Reject further operations and drop every registration.
    ///
    /// Handlers are dropped with their registrations, which lets waiters
    /// holding a one-shot gate observe that no event will come.
    pub fn close(&self) {
        self.registry.closed.store(true, Ordering::Release);
        let dropped = {
            let mut subs = self.registry.subscriptions.write();
            let count = subs.len();
            subs.clear();
            count
        };
        debug!(dropped, "Event bus closed");
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_closed() {
            Err(BusError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn post(&self, event: Event) -> Result<(), BusError> {
        self.ensure_open()?;
        event.validate()?;
        self.events_published.fetch_add(1, Ordering::Relaxed);
        debug!(topic = event.topic(), "Event posted");

        let Some(queue) = &self.queue else {
            self.registry.deliver_isolated(&event);
            return Ok(());
        };

        queue.send(event).map_err(|_| BusError::Closed)
    }

    fn send(&self, event: Event) -> Result<usize, BusError> {
        self.ensure_open()?;
        event.validate()?;
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let handlers = self.registry.matching(&event);
        for handler in &handlers {
            handler.handle_event(&event);
        }

        debug!(
            topic = event.topic(),
            receivers = handlers.len(),
            "Event sent"
        );
        Ok(handlers.len())
    }

    fn subscribe(
        &self,
        spec: SubscriptionSpec,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionId, BusError> {
        self.ensure_open()?;
        let matcher = spec.compile()?;
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        {
            let mut subs = self.registry.subscriptions.write();
            // Re-check under the lock so a racing close() cannot miss us.
            self.ensure_open()?;
            subs.insert(id, Registration { matcher, handler });
        }

        debug!(id = %id, topics = ?spec.topics, filter = ?spec.filter, "New subscription created");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let removed = self.registry.subscriptions.write().remove(&id);
        match removed {
            Some(_) => {
                debug!(id = %id, "Subscription removed");
                Ok(())
            }
            None if self.is_closed() => Err(BusError::Closed),
            None => Err(BusError::UnknownSubscription(id)),
        }
    }

    fn subscriber_count(&self) -> usize {
        self.registry.subscriptions.read().len()
    }
}
