//! # PubSub Client - Resilient Polling Runtime
//!
//! Drives the inbound pipeline from `pubsub-core` against a managed
//! queue/topic backend, with sequential multi-region failover.
//!
//! ```text
//! ┌────────────────┐   current region   ┌────────────────┐
//! │ FailoverPolicy │ ─────────────────→ │  QueueBackend  │
//! └────────────────┘                    └────────────────┘
//!         ↑  advance on                         │ receive
//!         │  failure / idle                     ▼
//!         │                             ┌────────────────┐
//!         └──────────────────────────── │     Poller     │
//!                                       └────────────────┘
//!                                               │ per item
//!                                               ▼
//!                                  decode → validate → dispatch
//! ```
//!
//! The backend is an external collaborator behind the [`QueueBackend`]
//! port; an in-memory implementation ships for tests and local runs.
//! Delivery is at-least-once: redelivery is governed by the backend's
//! visibility timeout, never by an in-process retry queue, and duplicate
//! or out-of-order envelopes are tolerated by design.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod failover;
pub mod memory;
pub mod poller;
pub mod ports;
pub mod publish;

// Re-export main types
pub use config::{ClientConfig, ConfigError, Credentials, FailoverMode, Region};
pub use failover::{FailoverPolicy, RegionCursor};
pub use memory::InMemoryQueueBackend;
pub use poller::{Poller, PollerError, PollerState};
pub use ports::{
    BackendError, QueueBackend, QueueHandle, QueueInfo, RawMessage, ReceiveOptions, TopicBackend,
};
pub use publish::{PublishError, Publisher};
