//! Reporting read path over the security event stream.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use openpoll_core::events::{SecurityEvent, Severity};
use openpoll_core::result::AppResult;
use openpoll_core::traits::audit::SecurityEventSink;

/// Aggregated view of a window of security events.
#[derive(Debug, Clone, Default)]
pub struct SecurityStats {
    /// Total events in the window.
    pub total: usize,
    /// Event counts keyed by kind label.
    pub by_kind: HashMap<String, usize>,
    /// Event counts keyed by severity.
    pub by_severity: HashMap<Severity, usize>,
    /// Fraction of events with `success == false`, 0.0 when empty.
    pub failure_rate: f64,
    /// The highest-risk events in the window, descending by score.
    pub top_risk: Vec<SecurityEvent>,
}

impl SecurityStats {
    /// Aggregates events between `from` and `to`, keeping at most
    /// `top_limit` high-risk events.
    pub async fn collect(
        sink: &dyn SecurityEventSink,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        top_limit: usize,
    ) -> AppResult<Self> {
        let mut events = sink.query_window(from, to).await?;

        let total = events.len();
        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut by_severity: HashMap<Severity, usize> = HashMap::new();
        let mut failures = 0usize;

        for event in &events {
            *by_kind.entry(event.kind.as_str().to_string()).or_default() += 1;
            *by_severity.entry(event.severity).or_default() += 1;
            if !event.success {
                failures += 1;
            }
        }

        let failure_rate = if total == 0 {
            0.0
        } else {
            failures as f64 / total as f64
        };

        events.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
        events.truncate(top_limit);

        Ok(Self {
            total,
            by_kind,
            by_severity,
            failure_rate,
            top_risk: events,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use openpoll_core::events::SecurityEventKind;

    use super::*;
    use crate::audit::memory::MemoryEventSink;

    fn event(kind: SecurityEventKind, success: bool, risk: u8) -> SecurityEvent {
        SecurityEvent {
            id: Uuid::new_v4(),
            kind,
            severity: Severity::derive(kind, success),
            success,
            user_id: None,
            email: None,
            ip_address: None,
            user_agent: None,
            details: None,
            risk_score: risk,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn collect_breaks_down_kinds_and_failures() {
        let sink = MemoryEventSink::new();
        sink.append(event(SecurityEventKind::LoginSuccess, true, 5))
            .await
            .unwrap();
        sink.append(event(SecurityEventKind::LoginFailure, false, 40))
            .await
            .unwrap();
        sink.append(event(SecurityEventKind::RateLimitExceeded, false, 65))
            .await
            .unwrap();

        let now = Utc::now();
        let stats = SecurityStats::collect(&sink, now - Duration::hours(1), now, 2)
            .await
            .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_kind.get("login_failure"), Some(&1));
        assert_eq!(stats.by_severity.get(&Severity::High), Some(&1));
        assert!((stats.failure_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.top_risk.len(), 2);
        assert_eq!(stats.top_risk[0].risk_score, 65);
    }

    #[tokio::test]
    async fn empty_window_has_zero_failure_rate() {
        let sink = MemoryEventSink::new();
        let now = Utc::now();
        let stats = SecurityStats::collect(&sink, now - Duration::hours(1), now, 10)
            .await
            .unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.failure_rate, 0.0);
    }
}
