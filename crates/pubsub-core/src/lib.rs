//! # PubSub Core - Inbound Message Pipeline
//!
//! The protocol heart of the pub/sub client: everything between a raw
//! queue item and a handler invocation.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   decode    ┌──────────────┐   validate   ┌──────────────┐
//! │  raw bytes   │ ──────────→ │   Envelope   │ ───────────→ │   Handler    │
//! │ (queue item) │             │ sender/type/ │              │   dispatch   │
//! └──────────────┘             │     data     │              └──────────────┘
//!                              └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - The envelope `sender` is the sole source of identity; payloads carry none.
//! - Validation outcomes are typed results, never panics: unknown senders and
//!   unknown message types are values the caller logs and skips.
//! - Handler resolution goes through an explicit registration table built at
//!   configuration time; a missing handler is a configuration fault and
//!   propagates instead of being swallowed.
//! - The registry is fully configured before polling starts and is read-shared
//!   (immutable by contract) thereafter.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod error;
pub mod handler;
pub mod identifier;
pub mod pipeline;
pub mod registry;
pub mod validate;

// Re-export main types
pub use envelope::Envelope;
pub use error::{DecodeError, DispatchError, PipelineError, Rejection};
pub use handler::{handler_type_name, HandlerTable, MessageHandler};
pub use identifier::ServiceIdentifier;
pub use pipeline::Pipeline;
pub use registry::SubscriptionRegistry;
pub use validate::validate;

/// Key of the transport notification wrapper applied when raw delivery
/// is disabled on the topic subscription.
pub const WRAPPER_KEY: &str = "Message";
