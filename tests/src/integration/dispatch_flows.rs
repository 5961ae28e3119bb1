//! # Dispatch Flows
//!
//! Request/response flows where a scheduled emission triggers a subscriber
//! that answers on another topic, and a waiter captures the answer.
//!
//! ```text
//! schedule_emit ──(delay)──→ "request/*" ──→ responder ──post──→ "reply/*"
//!                                                                  │
//! wait_for_event ←─────────────────────────────────────────────────┘
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use event_bus::{Event, EventBus, EventHandler, InMemoryEventBus, SubscriptionSpec};
    use event_sync::{
        schedule_emit, send_event, wait_for_event, DispatchError, EmitOptions, TimeUnit,
        WaitOptions,
    };
    use parking_lot::Mutex;
    use sync_telemetry::init_test_tracing;

    /// Answers every `request/<id>` with a `reply/<id>` carrying the request's
    /// `value` doubled.
    fn install_responder(bus: &Arc<InMemoryEventBus>) {
        let replies = Arc::downgrade(bus);
        let handler: Arc<dyn EventHandler> = Arc::new(move |request: &Event| {
            let Some(bus) = replies.upgrade() else {
                return;
            };
            let id = request.topic().trim_start_matches("request/");
            let value = request
                .property("value")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default();
            bus.post(Event::new(format!("reply/{id}")).with_property("value", value * 2))
                .unwrap();
        });
        bus.subscribe(SubscriptionSpec::topic("request/*"), handler)
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_request_reply_roundtrip() {
        init_test_tracing();
        let bus = Arc::new(InMemoryEventBus::new());
        install_responder(&bus);
        let baseline = bus.subscriber_count();

        let request = Event::new("request/7").with_property("value", 21);
        let handle = send_event(bus.clone(), request, 50).unwrap();

        let reply = wait_for_event(&*bus, &WaitOptions::topic("reply/7").timeout_millis(1_000))
            .await
            .unwrap()
            .expect("responder replies");

        assert_eq!(reply.property("value"), Some(&serde_json::json!(42)));
        handle.await.unwrap();
        assert_eq!(bus.subscriber_count(), baseline);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reply_filtered_by_value() {
        let bus = Arc::new(InMemoryEventBus::new());
        install_responder(&bus);

        let small = schedule_emit(
            bus.clone(),
            Event::new("request/a").with_property("value", 1),
            EmitOptions::post(20, TimeUnit::Milliseconds),
        )
        .unwrap();
        let large = schedule_emit(
            bus.clone(),
            Event::new("request/b").with_property("value", 50),
            EmitOptions::post(60, TimeUnit::Milliseconds),
        )
        .unwrap();

        let reply = wait_for_event(
            &*bus,
            &WaitOptions::topic("reply/*")
                .filter("(value>=10)")
                .timeout(1, TimeUnit::Seconds),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(reply.topic(), "reply/b");
        small.await.unwrap();
        large.await.unwrap();
    }

    /// A reply that never comes: the request is answered on the wrong id.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unanswered_request_times_out() {
        let bus = Arc::new(InMemoryEventBus::new());
        install_responder(&bus);

        let handle = send_event(bus.clone(), Event::new("request/x"), 10).unwrap();
        let reply =
            wait_for_event(&*bus, &WaitOptions::topic("reply/y").timeout_millis(150)).await;

        assert_eq!(reply, Ok(None));
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_request_produces_no_reply() {
        let bus = Arc::new(InMemoryEventBus::new());
        install_responder(&bus);

        let handle = send_event(bus.clone(), Event::new("request/c"), 200).unwrap();
        handle.cancel();

        let reply =
            wait_for_event(&*bus, &WaitOptions::topic("reply/c").timeout_millis(300)).await;

        assert_eq!(reply, Ok(None));
        assert_eq!(handle.await, Err(DispatchError::Cancelled));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_emissions_keep_their_own_schedule() {
        let bus = Arc::new(InMemoryEventBus::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = order.clone();
        let handler: Arc<dyn EventHandler> =
            Arc::new(move |e: &Event| sink.lock().push(e.topic().to_string()));
        bus.subscribe(SubscriptionSpec::topic("step/*"), handler)
            .unwrap();

        let handles = vec![
            send_event(bus.clone(), Event::new("step/3"), 90).unwrap(),
            send_event(bus.clone(), Event::new("step/1"), 10).unwrap(),
            send_event(bus.clone(), Event::new("step/2"), 50).unwrap(),
        ];
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock(), vec!["step/1", "step/2", "step/3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bus_closed_before_emission() {
        let bus = Arc::new(InMemoryEventBus::new());

        let handle = send_event(bus.clone(), Event::new("request/z"), 30).unwrap();
        bus.close();

        assert!(matches!(handle.await, Err(DispatchError::Delivery(_))));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(bus.subscriber_count(), 0);
    }
}
