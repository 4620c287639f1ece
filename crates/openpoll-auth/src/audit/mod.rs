//! Structured, append-only security audit logging.

pub mod logger;
pub mod memory;
pub mod risk;
pub mod stats;

pub use logger::{EventDraft, SecurityLogger};
pub use memory::MemoryEventSink;
pub use risk::RiskScorer;
pub use stats::SecurityStats;
