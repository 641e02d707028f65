//! # Handler Table & Dispatcher
//!
//! Maps message types to concrete handlers and invokes them with the
//! payload data.
//!
//! Resolution goes through an explicit registration table built at
//! configuration time, so there is no runtime string-to-type reflection:
//! each subscription supplies its handler up front. The snake-case to
//! PascalCase naming convention survives only as a diagnostic, naming the
//! handler a type was expected to have in error messages.

use crate::envelope::Envelope;
use crate::error::DispatchError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The single capability handler code is polymorphic over.
///
/// Handlers manage their own timeouts and side effects; the dispatcher
/// does not interpret handler-internal failures beyond surfacing them.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process the payload data of one validated envelope.
    async fn process(&self, data: Value) -> anyhow::Result<()>;
}

impl std::fmt::Debug for dyn MessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn MessageHandler")
    }
}

/// The conventional handler type name for a message type:
/// `entity_update` → `EntityUpdate`, `entity-update` → `EntityUpdate`.
#[must_use]
pub fn handler_type_name(message_type: &str) -> String {
    message_type
        .split(|c| c == '_' || c == '-')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Explicit message-type → handler registration table.
///
/// Built during the configuration phase alongside the subscription
/// registry, then read-shared for the lifetime of the poller.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a message type. Re-registering a type
    /// replaces the previous handler (last write wins during
    /// configuration).
    pub fn register(&mut self, message_type: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(message_type.into(), handler);
    }

    /// Resolve the handler for a message type.
    ///
    /// Failure is a configuration fault: the deployed handler set and the
    /// declared subscriptions have drifted. It propagates to the caller
    /// rather than being treated as a bad message.
    pub fn resolve(&self, message_type: &str) -> Result<&Arc<dyn MessageHandler>, DispatchError> {
        self.handlers
            .get(message_type)
            .ok_or_else(|| DispatchError::UnresolvedType {
                message_type: message_type.to_string(),
                expected: handler_type_name(message_type),
            })
    }

    /// Resolve and invoke the handler for a validated envelope.
    pub async fn dispatch(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let handler = self.resolve(&envelope.message_type)?;

        debug!(
            sender = %envelope.sender,
            message_type = %envelope.message_type,
            "Dispatching message"
        );

        handler
            .process(envelope.data.clone())
            .await
            .map_err(|source| DispatchError::HandlerFailed {
                message_type: envelope.message_type.clone(),
                source,
            })
    }

    /// Message types with a registered handler.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("types", &self.registered_types())
            .finish()
    }
}
