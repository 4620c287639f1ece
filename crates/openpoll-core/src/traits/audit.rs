//! Security event sink and escalation traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::events::SecurityEvent;
use crate::result::AppResult;

/// Durable, append-only storage for security events.
///
/// The logger treats append failures as best-effort: they are traced
/// and swallowed, never propagated into the primary operation.
#[async_trait]
pub trait SecurityEventSink: Send + Sync + std::fmt::Debug + 'static {
    /// Append an event to the stream.
    async fn append(&self, event: SecurityEvent) -> AppResult<()>;

    /// Query events within a time window (reporting read path, not part
    /// of the hot path).
    async fn query_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<SecurityEvent>>;
}

/// Callback invoked for events whose risk score meets the configured
/// high-risk threshold. Alerting only; no automated remediation.
pub trait EscalationHook: Send + Sync + 'static {
    /// Called with the finalized high-risk event.
    fn escalate(&self, event: &SecurityEvent);
}

/// No-op escalation hook for deployments without alerting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEscalation;

impl EscalationHook for NoopEscalation {
    fn escalate(&self, _event: &SecurityEvent) {}
}
