//! # Service Identifiers
//!
//! Canonical keys naming participating services. The identifier doubles as
//! the subscription key and the default topic name, so derivation must be
//! deterministic: any non-empty human-readable name maps to exactly one
//! identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized, opaque key naming a participating service.
///
/// Derived from a human-readable name (`"EntityService"` → `"entity-service"`)
/// or taken verbatim when the remote side already publishes a canonical
/// identifier (`"entity-service-prod"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ServiceIdentifier(String);

impl ServiceIdentifier {
    /// Derive the canonical identifier from a human-readable service name.
    ///
    /// CamelCase humps and runs of non-alphanumeric characters become token
    /// boundaries; tokens are lowercased and joined with `-`:
    ///
    /// - `"EntityService"` → `"entity-service"`
    /// - `"entity_service"` → `"entity-service"`
    /// - `"Entity Service Prod"` → `"entity-service-prod"`
    ///
    /// Derivation is total: a name with no alphanumeric characters falls
    /// back to the lowercased input so every non-empty name has exactly
    /// one identifier.
    #[must_use]
    pub fn derive(name: &str) -> Self {
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut prev_lower = false;

        for ch in name.chars() {
            if !ch.is_alphanumeric() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                prev_lower = false;
                continue;
            }
            // CamelCase hump: lowercase-to-uppercase transition starts a token
            if ch.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = ch.is_lowercase() || ch.is_numeric();
            current.extend(ch.to_lowercase());
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        if tokens.is_empty() {
            return Self(name.to_lowercase());
        }
        Self(tokens.join("-"))
    }

    /// Wrap an already-canonical identifier without re-deriving it.
    ///
    /// Used for senders that publish their identifier on the wire
    /// (the envelope `sender` field) and for custom subscriptions.
    #[must_use]
    pub fn from_raw(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier carries no content (e.g. a decoded envelope
    /// that omitted the `sender` field).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceIdentifier {
    fn from(identifier: &str) -> Self {
        Self::from_raw(identifier)
    }
}

impl From<String> for ServiceIdentifier {
    fn from(identifier: String) -> Self {
        Self::from_raw(identifier)
    }
}
