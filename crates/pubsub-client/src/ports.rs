//! # Driven Ports (Backend SPI)
//!
//! The interfaces the poller **requires** a concrete messaging backend to
//! implement. The core never talks to a managed service directly; a host
//! wires in an implementation (an SQS/SNS adapter in production, the
//! in-memory backend in tests).

use crate::config::Region;
use async_trait::async_trait;
use pubsub_core::ServiceIdentifier;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Region-level failures against the messaging backend.
///
/// These are never handled item-by-item; they trigger the poller's
/// `Failing` state and a region rotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend in a region cannot be reached.
    #[error("backend unavailable in {region}: {reason}")]
    Unavailable {
        /// Region the failure occurred in.
        region: Region,
        /// Backend-supplied detail.
        reason: String,
    },

    /// A call exceeded the backend's own deadline.
    #[error("backend operation timed out")]
    Timeout,

    /// The backend rejected the request outright.
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Handle to a provisioned queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    /// Backend queue URL.
    pub url: String,
    /// Region the queue lives in.
    pub region: Region,
}

/// Observability snapshot of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueInfo {
    /// Backend resource name.
    pub arn: String,
    /// Approximate number of visible items.
    pub approx_depth: u64,
}

/// One raw received item, body still undecoded.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Receipt identifier, unique per delivery.
    pub id: Uuid,
    /// Raw message body.
    pub body: String,
}

impl RawMessage {
    /// Wrap a body with a fresh receipt id.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
        }
    }
}

/// Parameters for one receive call.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveOptions {
    /// Exclusivity window for received items.
    pub visibility_timeout: Duration,
    /// Long-poll wait; the call blocks up to this long.
    pub max_wait: Duration,
}

/// Abstract interface to the managed queue service.
///
/// Implementations must be `Send + Sync`; the poller shares one instance
/// across its whole life.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Idempotently create or look up the service's queue in a region.
    async fn ensure_queue(
        &self,
        service: &ServiceIdentifier,
        region: &Region,
    ) -> Result<QueueHandle, BackendError>;

    /// Long-poll receive, blocking up to `opts.max_wait`. Zero items is a
    /// successful (empty) receive, not an error.
    async fn receive(
        &self,
        queue: &QueueHandle,
        opts: &ReceiveOptions,
    ) -> Result<Vec<RawMessage>, BackendError>;

    /// Queue metadata for observability.
    async fn describe(&self, queue: &QueueHandle) -> Result<QueueInfo, BackendError>;
}

/// Abstract interface to the topic side of the backend, consumed by the
/// outbound publisher.
#[async_trait]
pub trait TopicBackend: Send + Sync {
    /// Publish an encoded envelope to a topic.
    async fn publish(&self, topic: &str, body: String) -> Result<(), BackendError>;
}
