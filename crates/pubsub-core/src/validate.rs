//! # Validator
//!
//! Checks a decoded envelope's sender and type against the registry.
//! The outcome is a typed result; callers decide whether and how to log.

use crate::envelope::Envelope;
use crate::error::Rejection;
use crate::registry::SubscriptionRegistry;

/// Validate an envelope against the declared subscriptions.
///
/// Rules, in order:
///
/// 1. A whitelisted sender is accepted outright; the message type is not
///    checked for whitelisted senders.
/// 2. A sender with no registration, or an empty accepted-type set, is
///    rejected with [`Rejection::UnknownSender`].
/// 3. A known sender with a type outside its accepted set is rejected
///    with [`Rejection::UnknownMessageType`].
pub fn validate(envelope: &Envelope, registry: &SubscriptionRegistry) -> Result<(), Rejection> {
    if registry.is_whitelisted(&envelope.sender) {
        return Ok(());
    }

    let accepted = registry
        .lookup(&envelope.sender)
        .filter(|types| !types.is_empty())
        .ok_or_else(|| Rejection::UnknownSender {
            sender: envelope.sender.clone(),
        })?;

    if !accepted.contains(&envelope.message_type) {
        return Err(Rejection::UnknownMessageType {
            sender: envelope.sender.clone(),
            message_type: envelope.message_type.clone(),
        });
    }

    Ok(())
}
