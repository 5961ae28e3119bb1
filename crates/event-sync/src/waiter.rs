//! # Event Waiter
//!
//! Suspends the caller until an event matching a topic set (and optional
//! filter) is delivered by the bus, or until the timeout elapses.
//!
//! ## Sequence
//!
//! ```text
//! caller                     bus                     delivery thread
//!   │  subscribe(spec) ────►  │                            │
//!   │  await gate             │  ◄── post()/send()         │
//!   │                         │ ─────────────────────────► │ handle_event()
//!   │  ◄────────────── gate opened (first match only) ──── │
//!   │  unsubscribe(id) ────►  │                            │
//! ```
//!
//! ## Guarantees
//!
//! - The subscription exists before the caller starts waiting
//! - Only the first matching event is captured
//! - The subscription is removed on every exit path, including the wait
//!   future being dropped
//! - Timeout and interruption both yield `None`

use crate::config::WaitOptions;
use crate::error::SyncError;
use event_bus::{BusError, Event, EventBus, EventHandler, SubscriptionId, SubscriptionSpec};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Wait for the first event matching `options`.
///
/// # Returns
///
/// - `Ok(Some(event))` - a matching event arrived before the deadline
/// - `Ok(None)` - timed out, interrupted, or the bus dropped the subscription
/// - `Err(SyncError)` - invalid options or the bus refused the subscription;
///   nothing was registered
///
/// A `timeout` of `0` waits indefinitely.
pub async fn wait_for_event<B>(bus: &B, options: &WaitOptions) -> Result<Option<Event>, SyncError>
where
    B: EventBus + ?Sized,
{
    let deadline = options.validate()?;

    let (cell, gate) = CaptureCell::new();
    let guard = SubscriptionGuard::register(bus, options.subscription_spec(), Arc::new(cell))?;

    debug!(
        id = %guard.id(),
        topics = ?options.topics,
        filter = ?options.filter,
        timeout = ?deadline,
        "Waiting for event"
    );

    let started = Instant::now();
    let gated = await_gate(gate, options.interrupt.clone());
    let outcome = match deadline {
        Some(limit) => tokio::time::timeout(limit, gated)
            .await
            .unwrap_or(WaitOutcome::TimedOut),
        None => gated.await,
    };

    let id = guard.id();
    drop(guard);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        WaitOutcome::Captured(event) => {
            debug!(id = %id, topic = event.topic(), elapsed_ms, "Event captured");
            Ok(Some(event))
        }
        WaitOutcome::TimedOut => {
            debug!(id = %id, elapsed_ms, "Wait timed out");
            Ok(None)
        }
        WaitOutcome::Interrupted => {
            debug!(id = %id, elapsed_ms, "Wait interrupted");
            Ok(None)
        }
        WaitOutcome::Abandoned => {
            debug!(id = %id, elapsed_ms, "Subscription dropped by the bus");
            Ok(None)
        }
    }
}

enum WaitOutcome {
    Captured(Event),
    TimedOut,
    Interrupted,
    /// The handler was dropped without firing, e.g. the bus was closed.
    Abandoned,
}

async fn await_gate(gate: oneshot::Receiver<Event>, interrupt: Option<WaitInterrupt>) -> WaitOutcome {
    let interrupted = async move {
        match interrupt {
            Some(interrupt) => interrupt.interrupted().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        captured = gate => match captured {
            Ok(event) => WaitOutcome::Captured(event),
            Err(_) => WaitOutcome::Abandoned,
        },
        () = interrupted => WaitOutcome::Interrupted,
    }
}

/// Single-slot capture: the first delivered event takes the gate sender,
/// later deliveries find it gone and are ignored.
struct CaptureCell {
    gate: Mutex<Option<oneshot::Sender<Event>>>,
}

impl CaptureCell {
    fn new() -> (Self, oneshot::Receiver<Event>) {
        let (tx, rx) = oneshot::channel();
        let cell = Self {
            gate: Mutex::new(Some(tx)),
        };
        (cell, rx)
    }
}

impl EventHandler for CaptureCell {
    fn handle_event(&self, event: &Event) {
        let Some(gate) = self.gate.lock().take() else {
            return;
        };
        // The waiter may already have timed out and dropped the receiver.
        let _ = gate.send(event.clone());
    }
}

/// A bus subscription that is removed when the guard is dropped.
///
/// Removal failures are logged and otherwise ignored.
pub struct SubscriptionGuard<'a, B: EventBus + ?Sized> {
    bus: &'a B,
    id: SubscriptionId,
}

impl<'a, B: EventBus + ?Sized> SubscriptionGuard<'a, B> {
    /// Register `handler` for `spec` and guard the registration.
    pub fn register(
        bus: &'a B,
        spec: SubscriptionSpec,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Self, BusError> {
        let id = bus.subscribe(spec, handler)?;
        Ok(Self { bus, id })
    }

    /// The guarded subscription.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl<B: EventBus + ?Sized> Drop for SubscriptionGuard<'_, B> {
    fn drop(&mut self) {
        match self.bus.unsubscribe(self.id) {
            Ok(()) => debug!(id = %self.id, "Wait subscription removed"),
            Err(e) => warn!(id = %self.id, error = %e, "Failed to remove wait subscription"),
        }
    }
}

/// External signal that ends waits early.
///
/// Interrupted waits return `Ok(None)`, the same as a timeout. Once set, the
/// signal stays set: later waits using it return `None` right after
/// registering.
#[derive(Debug, Clone)]
pub struct WaitInterrupt {
    signal: Arc<watch::Sender<bool>>,
}

impl WaitInterrupt {
    #[must_use]
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Interrupt every wait using this signal.
    pub fn interrupt(&self) {
        self.signal.send_replace(true);
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        *self.signal.borrow()
    }

    async fn interrupted(&self) {
        let mut rx = self.signal.subscribe();
        // The sender lives in `self`, so this only returns once set.
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for WaitInterrupt {
    fn default() -> Self {
        Self::new()
    }
}
