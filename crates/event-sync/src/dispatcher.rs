//! # Delayed Dispatcher
//!
//! Schedules a single post or send on the ambient Tokio runtime and hands
//! back an [`EmitHandle`] to await or cancel it.
//!
//! The scheduling call never blocks. The bus call itself always runs on the
//! blocking pool, so it never lands on the calling thread, even with a zero
//! delay on a current-thread runtime. Bus errors surface through the handle.
//!
//! ## Lifecycle
//!
//! ```text
//! schedule_emit ──► waiting (deadline fixed at scheduling) ──► emitting ──► done
//!                      │                                          │
//!                      └── cancel() ──► Cancelled                 └── cancel() ignored
//! ```

use crate::config::{DeliveryMode, EmitOptions};
use crate::error::{DispatchError, SyncError};
use event_bus::{Event, EventBus};
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Schedule `event` to be emitted on `bus` after the configured delay.
///
/// The delay is measured from this call, not from when the runtime first
/// polls the emission.
///
/// # Errors
///
/// Returns [`SyncError::NoRuntime`] when called outside a Tokio runtime.
/// Nothing is scheduled in that case.
pub fn schedule_emit<B>(bus: Arc<B>, event: Event, options: EmitOptions) -> Result<EmitHandle, SyncError>
where
    B: EventBus + ?Sized + 'static,
{
    let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
    let delay = options.delay();
    // `None` only for delays too large to represent; those never fire.
    let deadline = Instant::now().checked_add(delay);
    let mode = options.mode;
    let topic = event.topic().to_string();

    debug!(
        topic = %topic,
        mode = ?mode,
        delay_ms = delay.as_millis() as u64,
        "Scheduling event emission"
    );

    let (cancel, cancel_rx) = watch::channel(false);
    let task = runtime.spawn(async move {
        let due = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel_requested(cancel_rx) => {
                debug!(topic = %event.topic(), "Scheduled event cancelled before emission");
                return Err(DispatchError::Cancelled);
            }
            () = due => {}
        }

        emit(bus, event, mode).await
    });

    Ok(EmitHandle {
        task,
        cancel,
        topic,
    })
}

/// Post `event` after `delay_millis` milliseconds.
pub fn post_event<B>(bus: Arc<B>, event: Event, delay_millis: u64) -> Result<EmitHandle, SyncError>
where
    B: EventBus + ?Sized + 'static,
{
    schedule_emit(bus, event, EmitOptions::post_after_millis(delay_millis))
}

/// Send `event` after `delay_millis` milliseconds.
pub fn send_event<B>(bus: Arc<B>, event: Event, delay_millis: u64) -> Result<EmitHandle, SyncError>
where
    B: EventBus + ?Sized + 'static,
{
    schedule_emit(bus, event, EmitOptions::send_after_millis(delay_millis))
}

/// Resolves once `cancel()` is called. A dropped handle never cancels.
async fn cancel_requested(mut cancel: watch::Receiver<bool>) {
    if cancel.wait_for(|set| *set).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn emit<B>(bus: Arc<B>, event: Event, mode: DeliveryMode) -> Result<(), DispatchError>
where
    B: EventBus + ?Sized + 'static,
{
    let topic = event.topic().to_string();
    // Send runs subscribers inline; post may too on a bus without a worker.
    let call = tokio::task::spawn_blocking(move || match mode {
        DeliveryMode::Post => bus.post(event),
        DeliveryMode::Send => bus.send(event).map(|_| ()),
    });

    let result = match call.await {
        Ok(delivered) => delivered.map_err(DispatchError::from),
        Err(e) if e.is_panic() => Err(DispatchError::Panicked(panic_message(e.into_panic()))),
        Err(_) => Err(DispatchError::Cancelled),
    };

    match &result {
        Ok(()) => debug!(topic = %topic, mode = ?mode, "Scheduled event emitted"),
        Err(e) => warn!(topic = %topic, mode = ?mode, error = %e, "Scheduled event emission failed"),
    }
    result
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Handle to a scheduled emission.
///
/// Awaiting it yields `Ok(())` once the bus call returned, or the error that
/// stopped it. Dropping the handle does not cancel the emission.
#[derive(Debug)]
pub struct EmitHandle {
    task: JoinHandle<Result<(), DispatchError>>,
    cancel: watch::Sender<bool>,
    topic: String,
}

impl EmitHandle {
    /// Cancel the emission if its delay has not elapsed yet.
    ///
    /// Once the bus call has started this is a no-op: the handle still
    /// completes with the outcome of that call.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether the emission has completed, failed or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Topic of the scheduled event.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Future for EmitHandle {
    type Output = Result<(), DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(DispatchError::Cancelled),
            Err(e) => Err(DispatchError::Panicked(panic_message(e.into_panic()))),
        })
    }
}
