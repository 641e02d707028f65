//! # Integration Scenarios
//!
//! Cross-crate tests driving the full inbound path: in-memory queue
//! backend → poller → decode → validate → dispatch.

pub mod resilience;
