//! In-memory security event sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use openpoll_core::events::SecurityEvent;
use openpoll_core::result::AppResult;
use openpoll_core::traits::audit::SecurityEventSink;

/// Append-only event storage backed by a `Vec`.
///
/// Suitable for tests and single-process deployments; events do not
/// survive a restart.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<SecurityEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events appended so far, in order.
    pub fn snapshot(&self) -> Vec<SecurityEvent> {
        self.events
            .try_read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SecurityEventSink for MemoryEventSink {
    async fn append(&self, event: SecurityEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn query_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<SecurityEvent>> {
        let guard = self.events.read().await;
        Ok(guard
            .iter()
            .filter(|e| e.occurred_at >= from && e.occurred_at <= to)
            .cloned()
            .collect())
    }
}
