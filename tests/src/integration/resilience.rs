//! # Resilience Scenarios
//!
//! Failure-path tests for the polling loop: region failover, per-item
//! isolation, idle rotation, cooperative shutdown, and the one fault that
//! is allowed to halt the loop (handler-resolution drift).

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    use async_trait::async_trait;
    use pubsub_client::{
        ClientConfig, FailoverPolicy, InMemoryQueueBackend, Poller, PollerError, Region,
        RegionCursor,
    };
    use pubsub_core::{
        HandlerTable, MessageHandler, Pipeline, ServiceIdentifier, SubscriptionRegistry,
    };
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct RecordingHandler {
        seen: Mutex<Vec<Value>>,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Value> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn process(&self, data: Value) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(data);
            Ok(())
        }
    }

    /// Fails every payload whose `poison` field is set, records the rest.
    struct PoisonAwareHandler {
        seen: Mutex<Vec<Value>>,
        failures: AtomicU32,
    }

    impl PoisonAwareHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                failures: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl MessageHandler for PoisonAwareHandler {
        async fn process(&self, data: Value) -> anyhow::Result<()> {
            if data.get("poison").is_some() {
                self.failures.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("poisoned payload");
            }
            self.seen.lock().unwrap().push(data);
            Ok(())
        }
    }

    fn config(regions: &[&str]) -> ClientConfig {
        let mut config =
            ClientConfig::new("EntityService", regions.iter().copied()).unwrap();
        config.idle_timeout = Duration::from_millis(500);
        config.max_wait = Duration::from_millis(20);
        config.validate().unwrap();
        config
    }

    fn pipeline(handler: Arc<dyn MessageHandler>) -> Pipeline {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe_custom(
            ServiceIdentifier::from_raw("entity-service"),
            ["entity_update"],
            None,
        );

        let mut handlers = HandlerTable::new();
        handlers.register("entity_update", handler);
        Pipeline::new(Arc::new(registry), Arc::new(handlers))
    }

    fn envelope(data: Value) -> String {
        json!({ "sender": "entity-service", "type": "entity_update", "data": data }).to_string()
    }

    // =============================================================================
    // FAILOVER
    // =============================================================================

    #[tokio::test]
    async fn test_rotation_past_downed_region() {
        crate::init_logging();
        let handler = RecordingHandler::new();
        let backend = Arc::new(InMemoryQueueBackend::new());
        let config = config(&["us-east-1", "us-west-1", "eu-west-1"]);
        let service = config.service.clone();

        let east = Region::new("us-east-1").unwrap();
        let west = Region::new("us-west-1").unwrap();
        let dublin = Region::new("eu-west-1").unwrap();

        // First two candidates down; the item waits in the third
        backend.set_region_down(&east, true);
        backend.set_region_down(&west, true);
        backend.push(&service, &dublin, envelope(json!({ "id": 9 })));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(
            config,
            pipeline(handler.clone()),
            backend,
            cursor.clone(),
            shutdown_rx,
        );
        let handle = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(handler.seen(), vec![json!({ "id": 9 })]);
        // Two failed regions were recorded before the successful receive
        assert_eq!(cursor.current_region(), dublin);
    }

    #[tokio::test]
    async fn test_recovery_after_region_comes_back() {
        let handler = RecordingHandler::new();
        let backend = Arc::new(InMemoryQueueBackend::new());
        let config = config(&["us-east-1", "us-west-1"]);
        let service = config.service.clone();
        let east = Region::new("us-east-1").unwrap();

        backend.set_region_down(&east, true);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(
            config,
            pipeline(handler.clone()),
            backend.clone(),
            cursor,
            shutdown_rx,
        );
        let handle = tokio::spawn(poller.run());

        // Let the poller rotate away, then restore the region and feed it
        tokio::time::sleep(Duration::from_millis(50)).await;
        backend.set_region_down(&east, false);
        backend.push(&service, &east, envelope(json!({ "id": 1 })));

        // The wraparound cursor eventually returns to us-east-1
        tokio::time::sleep(Duration::from_millis(700)).await;
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(handler.seen(), vec![json!({ "id": 1 })]);
    }

    // =============================================================================
    // PER-ITEM ISOLATION
    // =============================================================================

    #[tokio::test]
    async fn test_handler_failure_does_not_block_next_item() {
        let handler = PoisonAwareHandler::new();
        let backend = Arc::new(InMemoryQueueBackend::new());
        let config = config(&["us-east-1"]);
        let service = config.service.clone();
        let region = Region::new("us-east-1").unwrap();

        backend.push(&service, &region, envelope(json!({ "seq": 1 })));
        backend.push(&service, &region, envelope(json!({ "poison": true })));
        backend.push(&service, &region, envelope(json!({ "seq": 2 })));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(
            config,
            pipeline(handler.clone()),
            backend,
            cursor,
            shutdown_rx,
        );
        let handle = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // Item N failed, item N+1 still processed
        assert_eq!(handler.failures.load(Ordering::SeqCst), 1);
        let seen = handler.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[json!({ "seq": 1 }), json!({ "seq": 2 })]);
    }

    // =============================================================================
    // IDLE ROTATION
    // =============================================================================

    #[tokio::test]
    async fn test_idle_timeout_rotates_to_region_with_traffic() {
        let handler = RecordingHandler::new();
        let backend = Arc::new(InMemoryQueueBackend::new());
        let mut config = config(&["us-east-1", "us-west-1"]);
        config.idle_timeout = Duration::from_millis(60);
        let service = config.service.clone();
        let west = Region::new("us-west-1").unwrap();

        // us-east-1 is healthy but silent; the item sits in us-west-1
        backend.push(&service, &west, envelope(json!({ "id": 4 })));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(
            config,
            pipeline(handler.clone()),
            backend,
            cursor,
            shutdown_rx,
        );
        let handle = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(handler.seen(), vec![json!({ "id": 4 })]);
    }

    // =============================================================================
    // SHUTDOWN & FATAL FAULTS
    // =============================================================================

    #[tokio::test]
    async fn test_shutdown_interrupts_long_poll() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        let mut config = config(&["us-east-1"]);
        // Long poll far exceeds the test duration; shutdown must cut it short
        config.max_wait = Duration::from_secs(30);
        config.idle_timeout = Duration::from_secs(60);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(
            config,
            pipeline(RecordingHandler::new()),
            backend,
            cursor,
            shutdown_rx,
        );
        let handle = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        timeout(Duration::from_millis(500), handle)
            .await
            .expect("shutdown should interrupt the long poll promptly")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_handler_resolution_drift_halts_the_loop() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        let config = config(&["us-east-1"]);
        let service = config.service.clone();
        let region = Region::new("us-east-1").unwrap();

        // Subscribed type with no registered handler: deployment drift
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe_custom(
            ServiceIdentifier::from_raw("entity-service"),
            ["entity_update"],
            None,
        );
        let drifted = Pipeline::new(Arc::new(registry), Arc::new(HandlerTable::new()));

        backend.push(&service, &region, envelope(json!({})));

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let cursor = Arc::new(RegionCursor::new(config.regions.clone()));
        let poller = Poller::new(config, drifted, backend, cursor, shutdown_rx);

        let result = timeout(Duration::from_secs(2), tokio::spawn(poller.run()))
            .await
            .expect("poller should halt without a shutdown signal")
            .unwrap();

        assert!(matches!(result, Err(PollerError::HandlerResolution(_))));
    }
}
