//! # Envelope Decoder
//!
//! Parses raw queue items into a normalized envelope of `sender`, `type`,
//! and `data`, unwrapping the optional transport notification wrapper.
//!
//! Decoding is purely syntactic: a missing `sender` or `type` does not
//! fail here. Validation owns the unknown-sender report, so the decode
//! stage never has to know about the registry.

use crate::error::DecodeError;
use crate::identifier::ServiceIdentifier;
use crate::WRAPPER_KEY;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The normalized inbound unit: sender identifier, message type, and
/// opaque payload data.
///
/// On the wire:
///
/// ```json
/// { "sender": "entity-service", "type": "entity_update", "data": { "id": 11355 } }
/// ```
///
/// optionally wrapped once, with raw delivery disabled on the topic:
///
/// ```json
/// { "Message": "{\"sender\":…}", "TopicArn": "…", "Timestamp": "…" }
/// ```
///
/// Transport metadata alongside the wrapper is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Service where this message originated. Sole source of sender
    /// identity; payloads carry none.
    #[serde(default)]
    pub sender: ServiceIdentifier,

    /// Declared message type, keyed against the sender's subscription.
    #[serde(rename = "type", default)]
    pub message_type: String,

    /// Opaque payload handed to the resolved handler.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Build an envelope for the outbound path.
    #[must_use]
    pub fn new(sender: ServiceIdentifier, message_type: impl Into<String>, data: Value) -> Self {
        Self {
            sender,
            message_type: message_type.into(),
            data,
        }
    }

    /// Decode a raw message body.
    ///
    /// If the body is a notification wrapper (an object carrying a
    /// `"Message"` string field), the inner string is parsed as the real
    /// payload. The unwrap is applied at most once: a doubly-wrapped body
    /// decodes to whatever the first inner string literally contains, it
    /// is never recursively unwrapped again.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw)?;

        let value = match value.get(WRAPPER_KEY).and_then(Value::as_str) {
            Some(inner) => serde_json::from_str(inner)?,
            None => value,
        };

        Ok(serde_json::from_value(value)?)
    }

    /// Encode the envelope for an outbound publish.
    pub fn encode(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(self)?)
    }
}
