//! Security events emitted by OpenPoll operations.
//!
//! Events are appended to the configured sink and consumed by ops
//! tooling; the subsystem itself never mutates or deletes them.

pub mod security;

pub use security::{SecurityEvent, SecurityEventKind, Severity};
