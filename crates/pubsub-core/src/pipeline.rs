//! # Pipeline
//!
//! The per-item unit the poller drives: decode → validate → dispatch.
//!
//! One pipeline value is shared across the life of the poller; the
//! registry and handler table behind it are immutable once polling
//! starts.

use crate::envelope::Envelope;
use crate::error::PipelineError;
use crate::handler::HandlerTable;
use crate::registry::SubscriptionRegistry;
use crate::validate::validate;
use std::sync::Arc;
use tracing::debug;

/// Decode, validate, and dispatch raw message bodies.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<SubscriptionRegistry>,
    handlers: Arc<HandlerTable>,
}

impl Pipeline {
    /// Build a pipeline over a configured registry and handler table.
    #[must_use]
    pub fn new(registry: Arc<SubscriptionRegistry>, handlers: Arc<HandlerTable>) -> Self {
        Self { registry, handlers }
    }

    /// The subscription registry this pipeline validates against.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Run one raw item through the full pipeline.
    ///
    /// The envelope is owned by each stage in turn and dropped after
    /// dispatch or rejection; nothing is retained.
    pub async fn process(&self, raw: &str) -> Result<(), PipelineError> {
        let envelope = Envelope::decode(raw)?;

        debug!(
            sender = %envelope.sender,
            message_type = %envelope.message_type,
            "Decoded envelope"
        );

        validate(&envelope, &self.registry)?;
        self.handlers.dispatch(&envelope).await?;
        Ok(())
    }
}
