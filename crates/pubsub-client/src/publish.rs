//! # Publisher
//!
//! The thin outbound path: build an envelope with our own identity,
//! resolve the target topic through the registry's bindings, encode, and
//! hand the body to the topic backend. Delivery semantics live entirely
//! in the backend.

use crate::ports::{BackendError, TopicBackend};
use pubsub_core::{Envelope, ServiceIdentifier, SubscriptionRegistry};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from an outbound publish.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The envelope failed to serialize.
    #[error(transparent)]
    Encode(#[from] pubsub_core::DecodeError),

    /// The backend refused the publish.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Outbound publisher for one service identity.
pub struct Publisher {
    service: ServiceIdentifier,
    registry: Arc<SubscriptionRegistry>,
    backend: Arc<dyn TopicBackend>,
}

impl Publisher {
    /// Build a publisher that stamps `service` as the envelope sender.
    #[must_use]
    pub fn new(
        service: ServiceIdentifier,
        registry: Arc<SubscriptionRegistry>,
        backend: Arc<dyn TopicBackend>,
    ) -> Self {
        Self {
            service,
            registry,
            backend,
        }
    }

    /// Publish `data` as `message_type` to the topic bound to `target`.
    ///
    /// The topic defaults to the target identifier itself when no custom
    /// binding was registered.
    pub async fn publish(
        &self,
        target: &ServiceIdentifier,
        message_type: impl Into<String>,
        data: Value,
    ) -> Result<(), PublishError> {
        let envelope = Envelope::new(self.service.clone(), message_type, data);
        let topic = self.registry.topic_for(target);
        let body = envelope.encode()?;

        debug!(
            topic = %topic,
            message_type = %envelope.message_type,
            "Publishing message"
        );

        self.backend.publish(&topic, body).await?;
        Ok(())
    }
}
