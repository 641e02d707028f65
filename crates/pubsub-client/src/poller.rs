//! # Poller
//!
//! The resilient loop: long-polls the current region's queue, runs each
//! received item through the pipeline, isolates per-item failures, and on
//! sustained failure or idle exhaustion advances to the next region.
//!
//! ## State machine
//!
//! ```text
//!      ┌────────────┐ queue ready ┌───────────┐
//!  ──→ │ Connecting │ ──────────→ │  Polling  │ ←─┐ per-item
//!      └────────────┘             └───────────┘ ──┘ drain
//!            ↑   ↖ error              │    │
//!            │    ╲                   │    │ shutdown
//!      next  │     ╲ backend error /  │    ▼
//!      region│      ╲ idle timeout    │ ┌─────────┐
//!          ┌─────────┐ ←──────────────┘ │ Stopped │
//!          │ Failing │                  └─────────┘
//!          └─────────┘
//! ```
//!
//! Region rotation triggers on BOTH backend errors and the idle timeout:
//! error rotation preserves availability through hard outages, idle
//! rotation un-wedges a region whose backend is silently unresponsive.
//!
//! Item-level errors never escape the loop; the single exception is a
//! handler-resolution failure, which means the deployed handler set and
//! the declared subscriptions have drifted and must surface immediately.

use crate::config::ClientConfig;
use crate::failover::FailoverPolicy;
use crate::ports::{BackendError, QueueBackend, QueueHandle, RawMessage, ReceiveOptions};
use pubsub_core::{Pipeline, PipelineError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Errors that terminate the polling loop.
#[derive(Debug, Error)]
pub enum PollerError {
    /// A message type validated against the subscriptions has no
    /// registered handler. Configuration drift; not recoverable in-process.
    #[error("handler resolution failed: {0}")]
    HandlerResolution(#[source] PipelineError),
}

/// Observable poller states, in the order the loop visits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    /// Obtaining the queue endpoint for a region.
    Connecting,
    /// Long-polling the connected region's queue.
    Polling,
    /// Rotating to the next candidate region.
    Failing,
    /// Shut down by the cooperative signal.
    Stopped,
}

/// The per-service polling worker.
///
/// One logical loop per service process; concurrency, if desired, comes
/// from running multiple independent workers against the same queue and
/// relying on the backend's visibility-timeout exclusivity.
pub struct Poller {
    config: ClientConfig,
    pipeline: Pipeline,
    backend: Arc<dyn QueueBackend>,
    failover: Arc<dyn FailoverPolicy>,
    shutdown: watch::Receiver<bool>,
    state: PollerState,
}

impl Poller {
    /// Assemble a poller over a validated configuration.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        pipeline: Pipeline,
        backend: Arc<dyn QueueBackend>,
        failover: Arc<dyn FailoverPolicy>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            pipeline,
            backend,
            failover,
            shutdown,
            state: PollerState::Connecting,
        }
    }

    /// The state the loop was last in.
    #[must_use]
    pub fn state(&self) -> &PollerState {
        &self.state
    }

    fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            visibility_timeout: self.config.visibility_timeout,
            max_wait: self.config.max_wait,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Drive the loop until shutdown or an unrecoverable configuration
    /// fault. Designed to run forever otherwise: no single item or single
    /// region failure terminates it.
    pub async fn run(mut self) -> Result<(), PollerError> {
        info!(
            service = %self.config.service,
            region = %self.failover.current_region(),
            "Poller starting"
        );

        loop {
            if self.shutdown_requested() {
                self.state = PollerState::Stopped;
                info!(service = %self.config.service, "Poller stopped");
                return Ok(());
            }

            match self.state {
                PollerState::Connecting => self.connect().await,
                // Polling is entered directly from connect() with its handle
                PollerState::Polling | PollerState::Failing => self.rotate(),
                PollerState::Stopped => return Ok(()),
            }?;
        }
    }

    /// `Connecting`: obtain the queue endpoint, then drain it until the
    /// region fails or goes idle.
    async fn connect(&mut self) -> Result<(), PollerError> {
        let region = self.failover.current_region();

        match self.backend.ensure_queue(&self.config.service, &region).await {
            Ok(queue) => {
                info!(url = %queue.url, region = %region, "Connected to queue");
                self.state = PollerState::Polling;
                self.poll_region(queue).await
            }
            Err(e) => {
                warn!(region = %region, error = %e, "Failed to connect to queue");
                self.state = PollerState::Failing;
                Ok(())
            }
        }
    }

    /// `Polling`: long-poll receive until a backend error, the idle
    /// timeout, or shutdown. Each received batch is drained sequentially
    /// in receive order.
    async fn poll_region(&mut self, queue: QueueHandle) -> Result<(), PollerError> {
        let opts = self.receive_options();
        let mut last_receipt = Instant::now();

        loop {
            if self.shutdown_requested() {
                return Ok(());
            }

            let mut shutdown = self.shutdown.clone();
            let received = tokio::select! {
                received = self.backend.receive(&queue, &opts) => received,
                _ = shutdown.changed() => {
                    debug!("Shutdown signal received during poll");
                    return Ok(());
                }
            };

            match received {
                Ok(batch) => {
                    if !batch.is_empty() {
                        self.failover.record_success();
                        last_receipt = Instant::now();
                        self.drain_batch(batch).await?;
                    }

                    if last_receipt.elapsed() >= self.config.idle_timeout {
                        info!(
                            region = %queue.region,
                            idle_secs = self.config.idle_timeout.as_secs(),
                            "Idle timeout elapsed, rotating region"
                        );
                        self.state = PollerState::Failing;
                        return Ok(());
                    }
                }
                Err(e) => {
                    self.report_backend_error(&queue, &e);
                    self.state = PollerState::Failing;
                    return Ok(());
                }
            }
        }
    }

    /// `Draining`: run items through decode → validate → dispatch, one at
    /// a time in receive order. Item-level errors are logged and skipped;
    /// the backend's visibility timeout governs any retry. Shutdown is
    /// checked between items, never mid-dispatch.
    async fn drain_batch(&mut self, batch: Vec<RawMessage>) -> Result<(), PollerError> {
        for item in batch {
            if self.shutdown_requested() {
                return Ok(());
            }

            debug!(service = %self.config.service, id = %item.id, "Received item");

            match self.pipeline.process(&item.body).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!(id = %item.id, error = %e, "Handler resolution failed, halting");
                    return Err(PollerError::HandlerResolution(e));
                }
                Err(e) => {
                    // One bad message must not halt the stream, but the
                    // failure has to reach the logs before being discarded.
                    warn!(id = %item.id, error = %e, "Item skipped");
                }
            }
        }
        Ok(())
    }

    /// `Failing`: hand the region over to the failover collaborator and
    /// reconnect in the next one.
    fn rotate(&mut self) -> Result<(), PollerError> {
        self.failover.record_failure();
        let next = self.failover.advance();

        debug!(
            next_region = %next,
            consecutive_failures = self.failover.consecutive_failures(),
            "Rotating region"
        );
        self.state = PollerState::Connecting;
        Ok(())
    }

    fn report_backend_error(&self, queue: &QueueHandle, error: &BackendError) {
        warn!(
            region = %queue.region,
            url = %queue.url,
            error = %error,
            "Backend receive failed"
        );
    }
}
