//! # Error Types
//!
//! The pipeline error taxonomy. Item-level outcomes (malformed payloads,
//! rejections, handler failures) are values the poller logs and skips;
//! only handler-resolution failures are fatal, because they mean the
//! deployed handler set and the declared subscriptions have drifted.

use crate::identifier::ServiceIdentifier;
use thiserror::Error;

/// Errors turning raw bytes into an [`crate::Envelope`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not parseable structured data.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// A validation rejection with a typed reason.
///
/// Rejections are expected per-item outcomes, not faults: the poller turns
/// them into a logged-and-skipped item and keeps draining the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Sender has no registered subscription and is not whitelisted.
    #[error("received a message from {sender} but we do not subscribe to that service")]
    UnknownSender {
        /// The envelope sender.
        sender: ServiceIdentifier,
    },

    /// Sender is known but the message type is not in its accepted set.
    #[error("received a message from {sender} but it was of unknown type {message_type}")]
    UnknownMessageType {
        /// The envelope sender.
        sender: ServiceIdentifier,
        /// The unaccepted message type.
        message_type: String,
    },
}

/// Errors from handler resolution and invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the message type. This is a
    /// configuration fault (deployment drift), not a bad message, and
    /// must propagate rather than be skipped.
    #[error("no handler registered for message type {message_type} (expected {expected})")]
    UnresolvedType {
        /// The message type that failed to resolve.
        message_type: String,
        /// The conventional handler name for the type.
        expected: String,
    },

    /// The resolved handler returned an error while processing.
    #[error("handler for {message_type} failed")]
    HandlerFailed {
        /// The message type being dispatched.
        message_type: String,
        /// The handler's own error.
        #[source]
        source: anyhow::Error,
    },
}

/// Umbrella error for one item's trip through the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decode stage failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Validation stage rejection.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Dispatch stage failure.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PipelineError {
    /// True if this error must propagate out of the polling loop instead
    /// of being logged and skipped.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Dispatch(DispatchError::UnresolvedType { .. })
        )
    }
}
