//! # Wait Scenarios
//!
//! End-to-end checks of `wait_for_event` through the public API:
//!
//! 1. **Timing**: bounded waits return close to their deadline; a zero
//!    timeout waits as long as it takes
//! 2. **Matching**: filters, multiple topics, first-event-wins
//! 3. **Cleanup**: the bus subscriber count returns to its prior value on
//!    every path

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use event_bus::{Event, EventBus, EventHandler, InMemoryEventBus, SubscriptionSpec};
    use event_sync::{
        post_event, send_event, wait_for_event, SyncError, TimeUnit, WaitInterrupt, WaitOptions,
    };
    use sync_telemetry::init_test_tracing;

    // =========================================================================
    // TIMING
    // =========================================================================

    /// Post "ping" after 50ms while waiting up to 500ms.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_ping_posted_after_delay_is_observed() {
        init_test_tracing();
        let bus = Arc::new(InMemoryEventBus::new());
        let started = Instant::now();

        let handle = post_event(bus.clone(), Event::new("ping"), 50).unwrap();
        let event = wait_for_event(&*bus, &WaitOptions::topic("ping").timeout_millis(500))
            .await
            .unwrap()
            .expect("ping should arrive before the deadline");
        let elapsed = started.elapsed();

        assert_eq!(event.topic(), "ping");
        assert!(elapsed >= Duration::from_millis(50), "too early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(250), "too late: {elapsed:?}");
        handle.await.unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }

    /// Nothing emits "never": the wait returns `None`, not before 100ms.
    #[tokio::test]
    async fn test_unanswered_wait_times_out() {
        init_test_tracing();
        let bus = InMemoryEventBus::new();
        let started = Instant::now();

        let result = wait_for_event(&bus, &WaitOptions::topic("never").timeout_millis(100)).await;

        assert_eq!(result, Ok(None));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_units_are_honoured() {
        let bus = InMemoryEventBus::new();
        let started = Instant::now();

        let result = wait_for_event(
            &bus,
            &WaitOptions::topic("never").timeout(80_000, TimeUnit::Microseconds),
        )
        .await;

        assert_eq!(result, Ok(None));
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_zero_timeout_has_no_upper_bound() {
        let bus = Arc::new(InMemoryEventBus::new());
        let started = Instant::now();

        let handle = send_event(bus.clone(), Event::new("eventually"), 400).unwrap();
        let event = wait_for_event(&*bus, &WaitOptions::topic("eventually"))
            .await
            .unwrap();

        assert!(event.is_some());
        assert!(started.elapsed() >= Duration::from_millis(400));
        handle.await.unwrap();
    }

    // =========================================================================
    // MATCHING
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_filter_boundaries() {
        let bus = Arc::new(InMemoryEventBus::new());
        let event = Event::new("topic/T1").with_property("P", 5);

        let handle = post_event(bus.clone(), event, 30).unwrap();
        let ge5 = WaitOptions::topic("topic/T1").filter("(P>=5)").timeout_millis(1_000);
        let gt10 = WaitOptions::topic("topic/T1").filter("(P>10)").timeout_millis(300);
        let (ge5, gt10) = tokio::join!(wait_for_event(&*bus, &ge5), wait_for_event(&*bus, &gt10));

        assert_eq!(
            ge5.unwrap().and_then(|e| e.property("P").cloned()),
            Some(serde_json::json!(5))
        );
        assert_eq!(gt10, Ok(None));
        handle.await.unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_any_of_several_topics() {
        let bus = Arc::new(InMemoryEventBus::new());

        let handle = post_event(bus.clone(), Event::new("topic/B"), 20).unwrap();
        let event = wait_for_event(
            &*bus,
            &WaitOptions::topics(["topic/A", "topic/B"]).timeout_millis(1_000),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(event.topic(), "topic/B");
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wildcard_topic_with_topic_filter() {
        let bus = Arc::new(InMemoryEventBus::new());

        let a = post_event(bus.clone(), Event::new("device/1/STOPPED"), 10).unwrap();
        let b = post_event(bus.clone(), Event::new("device/2/STARTED"), 40).unwrap();
        let event = wait_for_event(
            &*bus,
            &WaitOptions::topic("device/*")
                .filter("(event.topics=*/STARTED)")
                .timeout_millis(1_000),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(event.topic(), "device/2/STARTED");
        a.await.unwrap();
        b.await.unwrap();
    }

    /// Two matching events in a row: only the first is returned.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_first_delivered_event_wins() {
        let bus = Arc::new(InMemoryEventBus::new());
        let emitter = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            emitter.post(Event::new("seq").with_property("n", 1)).unwrap();
            emitter.post(Event::new("seq").with_property("n", 2)).unwrap();
        });

        let event = wait_for_event(&*bus, &WaitOptions::topic("seq").timeout_millis(1_000))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(event.property("n"), Some(&serde_json::json!(1)));
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    #[tokio::test]
    async fn test_negative_timeout_leaves_bus_untouched() {
        let bus = InMemoryEventBus::new();
        let keep: Arc<dyn EventHandler> = Arc::new(|_: &Event| {});
        bus.subscribe(SubscriptionSpec::topic("other"), keep).unwrap();
        let before = bus.subscriber_count();

        let result = wait_for_event(&bus, &WaitOptions::topic("ping").timeout_millis(-1)).await;

        assert_eq!(result, Err(SyncError::NegativeTimeout { value: -1 }));
        assert_eq!(bus.subscriber_count(), before);
    }

    /// Interruption is reported as "no event", exactly like a timeout.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_interruption_is_indistinguishable_from_timeout() {
        let bus = Arc::new(InMemoryEventBus::new());
        let interrupt = WaitInterrupt::new();

        let waiter = {
            let bus = bus.clone();
            let options = WaitOptions::topic("ping").interrupt(&interrupt);
            tokio::spawn(async move { wait_for_event(&*bus, &options).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(bus.subscriber_count(), 1);

        interrupt.interrupt();
        let result = waiter.await.unwrap();

        assert_eq!(result, Ok(None));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_waits_clean_up() {
        init_test_tracing();
        let bus = Arc::new(InMemoryEventBus::new());

        let waiters: Vec<_> = (0..32)
            .map(|i| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    let options = WaitOptions::topic("fanout")
                        .filter(format!("(slot={})", i % 2))
                        .timeout_millis(2_000);
                    wait_for_event(&*bus, &options).await
                })
            })
            .collect();

        // Wait until every waiter has registered before emitting.
        for _ in 0..200 {
            if bus.subscriber_count() == 32 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(bus.subscriber_count(), 32);

        bus.send(Event::new("fanout").with_property("slot", 0)).unwrap();
        bus.send(Event::new("fanout").with_property("slot", 1)).unwrap();

        let results = futures::future::join_all(waiters).await;
        for (i, result) in results.into_iter().enumerate() {
            let event = result.unwrap().unwrap().expect("every waiter is answered");
            assert_eq!(event.property("slot"), Some(&serde_json::json!(i % 2)));
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
