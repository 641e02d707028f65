//! # In-Memory Queue Backend
//!
//! A [`QueueBackend`]/[`TopicBackend`] implementation backed by process
//! memory. Suitable for tests and single-process local runs; real
//! deployments wire in an adapter over the managed service instead.
//!
//! Regions can be marked down to simulate outages, which is how the
//! failover behavior of the poller is exercised without a network.

use crate::config::Region;
use crate::ports::{
    BackendError, QueueBackend, QueueHandle, QueueInfo, RawMessage, ReceiveOptions, TopicBackend,
};
use async_trait::async_trait;
use pubsub_core::ServiceIdentifier;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;
use tracing::debug;

/// Most items handed out per receive call.
const MAX_BATCH: usize = 10;

#[derive(Default)]
struct State {
    /// FIFO queue per queue URL.
    queues: HashMap<String, VecDeque<RawMessage>>,
    /// Topic name → queue URLs subscribed to it.
    topic_bindings: HashMap<String, Vec<String>>,
    /// Regions currently simulating an outage.
    down_regions: HashSet<Region>,
}

/// In-memory messaging backend with simulated region outages.
#[derive(Default)]
pub struct InMemoryQueueBackend {
    state: Mutex<State>,
    notify: Notify,
}

impl InMemoryQueueBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_url(service: &ServiceIdentifier, region: &Region) -> String {
        format!("mem://{region}/{service}")
    }

    /// Enqueue a raw body on a service's queue in a region.
    pub fn push(&self, service: &ServiceIdentifier, region: &Region, body: impl Into<String>) {
        let url = Self::queue_url(service, region);
        {
            let mut state = self.state.lock().expect("backend state poisoned");
            state
                .queues
                .entry(url)
                .or_default()
                .push_back(RawMessage::new(body));
        }
        self.notify.notify_waiters();
    }

    /// Route a topic to a service's queue in a region, so published
    /// envelopes become receivable items.
    pub fn bind_topic(&self, topic: &str, service: &ServiceIdentifier, region: &Region) {
        let url = Self::queue_url(service, region);
        let mut state = self.state.lock().expect("backend state poisoned");
        state
            .topic_bindings
            .entry(topic.to_string())
            .or_default()
            .push(url);
    }

    /// Mark a region up or down. Down regions fail `ensure_queue` and
    /// `receive` with [`BackendError::Unavailable`].
    pub fn set_region_down(&self, region: &Region, down: bool) {
        let mut state = self.state.lock().expect("backend state poisoned");
        if down {
            state.down_regions.insert(region.clone());
        } else {
            state.down_regions.remove(region);
        }
        drop(state);
        // Wake any long-poll so it observes the outage promptly
        self.notify.notify_waiters();
    }

    fn check_region(&self, region: &Region) -> Result<(), BackendError> {
        let state = self.state.lock().expect("backend state poisoned");
        if state.down_regions.contains(region) {
            return Err(BackendError::Unavailable {
                region: region.clone(),
                reason: "region marked down".to_string(),
            });
        }
        Ok(())
    }

    fn try_drain(&self, url: &str) -> Vec<RawMessage> {
        let mut state = self.state.lock().expect("backend state poisoned");
        let Some(queue) = state.queues.get_mut(url) else {
            return Vec::new();
        };
        let take = queue.len().min(MAX_BATCH);
        queue.drain(..take).collect()
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn ensure_queue(
        &self,
        service: &ServiceIdentifier,
        region: &Region,
    ) -> Result<QueueHandle, BackendError> {
        self.check_region(region)?;

        let url = Self::queue_url(service, region);
        let mut state = self.state.lock().expect("backend state poisoned");
        state.queues.entry(url.clone()).or_default();
        drop(state);

        debug!(url = %url, "Queue ensured");
        Ok(QueueHandle {
            url,
            region: region.clone(),
        })
    }

    async fn receive(
        &self,
        queue: &QueueHandle,
        opts: &ReceiveOptions,
    ) -> Result<Vec<RawMessage>, BackendError> {
        let deadline = tokio::time::Instant::now() + opts.max_wait;

        loop {
            self.check_region(&queue.region)?;

            // Register for wakeups before checking the queue, so a push
            // between the check and the wait is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batch = self.try_drain(&queue.url);
            if !batch.is_empty() {
                return Ok(batch);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                // Long poll elapsed with nothing to hand out
                return Ok(Vec::new());
            }
        }
    }

    async fn describe(&self, queue: &QueueHandle) -> Result<QueueInfo, BackendError> {
        self.check_region(&queue.region)?;

        let state = self.state.lock().expect("backend state poisoned");
        let depth = state.queues.get(&queue.url).map_or(0, VecDeque::len) as u64;

        Ok(QueueInfo {
            arn: format!("arn:mem:{}", queue.url),
            approx_depth: depth,
        })
    }
}

#[async_trait]
impl TopicBackend for InMemoryQueueBackend {
    async fn publish(&self, topic: &str, body: String) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("backend state poisoned");
        let urls = state
            .topic_bindings
            .get(topic)
            .cloned()
            .unwrap_or_default();

        for url in urls {
            state
                .queues
                .entry(url)
                .or_default()
                .push_back(RawMessage::new(body.clone()));
        }
        drop(state);

        self.notify.notify_waiters();
        Ok(())
    }
}
