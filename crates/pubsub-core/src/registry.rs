//! # Subscription Registry
//!
//! Holds, per remote service: the set of accepted message types and the
//! topic name used when that service is a publish target, plus a global
//! sender whitelist.
//!
//! ## Ownership
//!
//! The registry is owned by the configuration phase and read-shared
//! (behind `Arc`, immutable by contract) once polling starts. There is no
//! internal locking: configuration must complete before the poller runs.

use crate::identifier::ServiceIdentifier;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Registry of declared subscriptions, topic bindings, and the whitelist.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    /// Accepted message types by sender.
    subscriptions: HashMap<ServiceIdentifier, BTreeSet<String>>,

    /// Topic bindings by identifier, used for outbound publishes.
    topics: HashMap<ServiceIdentifier, String>,

    /// Senders exempt from the subscription check entirely.
    whitelist: HashSet<ServiceIdentifier>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a remote service by its human-readable name.
    ///
    /// The identifier derived from `service_name` is used for both the
    /// sender key and the topic.
    pub fn subscribe<I, S>(&mut self, service_name: &str, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifier = ServiceIdentifier::derive(service_name);
        self.subscribe_custom(identifier, messages, None);
    }

    /// Fully custom subscription: sender, messages, and topic independently.
    ///
    /// If `topic` is `None`, the identifier itself is used. Re-registering
    /// an identifier replaces its previous subscription (last write wins
    /// during the configuration phase).
    pub fn subscribe_custom<I, S>(
        &mut self,
        identifier: ServiceIdentifier,
        messages: I,
        topic: Option<String>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.subscriptions.contains_key(&identifier) {
            warn!(sender = %identifier, "Subscription already registered, replacing");
        }

        let topic = topic.unwrap_or_else(|| identifier.as_str().to_string());
        let messages: BTreeSet<String> = messages.into_iter().map(Into::into).collect();

        self.subscriptions.insert(identifier.clone(), messages);
        self.topics.insert(identifier, topic);
    }

    /// The accepted message types for a sender, if it was ever registered.
    #[must_use]
    pub fn lookup(&self, identifier: &ServiceIdentifier) -> Option<&BTreeSet<String>> {
        self.subscriptions.get(identifier)
    }

    /// True iff the sender's accepted set contains `message_type`, or the
    /// sender is whitelisted (whitelisted senders bypass the type check).
    #[must_use]
    pub fn is_accepted(&self, identifier: &ServiceIdentifier, message_type: &str) -> bool {
        if self.is_whitelisted(identifier) {
            return true;
        }
        self.lookup(identifier)
            .is_some_and(|types| types.contains(message_type))
    }

    /// Add a sender to the whitelist, exempting it from the subscription
    /// check.
    pub fn add_to_whitelist(&mut self, identifier: ServiceIdentifier) {
        self.whitelist.insert(identifier);
    }

    /// True if the sender is whitelisted.
    #[must_use]
    pub fn is_whitelisted(&self, identifier: &ServiceIdentifier) -> bool {
        self.whitelist.contains(identifier)
    }

    /// The topic bound to an identifier, defaulting to the identifier
    /// itself when no binding was registered.
    #[must_use]
    pub fn topic_for(&self, identifier: &ServiceIdentifier) -> String {
        self.topics
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| identifier.as_str().to_string())
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// True if no subscriptions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
