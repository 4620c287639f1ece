//! The security event logger: severity derivation, risk scoring, and
//! best-effort persistence.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use openpoll_core::config::security::SecurityConfig;
use openpoll_core::events::{SecurityEvent, SecurityEventKind, Severity};
use openpoll_core::traits::audit::{EscalationHook, SecurityEventSink};

use super::risk::RiskScorer;

/// A security event before severity and risk have been computed.
#[derive(Debug, Clone)]
pub struct EventDraft {
    kind: SecurityEventKind,
    success: bool,
    user_id: Option<Uuid>,
    email: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: Option<serde_json::Value>,
    attempt_count: Option<u32>,
}

impl EventDraft {
    /// Starts a draft for the given kind and outcome.
    pub fn new(kind: SecurityEventKind, success: bool) -> Self {
        Self {
            kind,
            success,
            user_id: None,
            email: None,
            ip_address: None,
            user_agent: None,
            details: None,
            attempt_count: None,
        }
    }

    /// Attaches the acting user.
    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attaches the email involved (stored lowercased).
    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_lowercase());
        self
    }

    /// Attaches the request origin.
    pub fn origin(mut self, ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        self.ip_address = ip_address.map(String::from);
        self.user_agent = user_agent.map(String::from);
        self
    }

    /// Attaches free-form details.
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches the observed attempt count for risk scaling.
    pub fn attempts(mut self, count: u32) -> Self {
        self.attempt_count = Some(count);
        self
    }
}

/// Appends security events to the configured sink.
///
/// Logging is fire-and-forget: a sink failure is traced and swallowed,
/// never propagated into the operation that produced the event. Events
/// whose risk score reaches the configured threshold additionally
/// trigger the escalation hook.
pub struct SecurityLogger {
    /// Durable event storage.
    sink: Arc<dyn SecurityEventSink>,
    /// Risk computation.
    scorer: RiskScorer,
    /// Alerting callback for high-risk events.
    hook: Arc<dyn EscalationHook>,
    /// Risk score at or above which the hook fires.
    high_risk_threshold: u8,
}

impl std::fmt::Debug for SecurityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityLogger")
            .field("high_risk_threshold", &self.high_risk_threshold)
            .finish()
    }
}

impl SecurityLogger {
    /// Creates a new logger.
    pub fn new(
        sink: Arc<dyn SecurityEventSink>,
        config: SecurityConfig,
        hook: Arc<dyn EscalationHook>,
    ) -> Self {
        let high_risk_threshold = config.high_risk_threshold;
        Self {
            sink,
            scorer: RiskScorer::new(config),
            hook,
            high_risk_threshold,
        }
    }

    /// Finalizes and appends a draft.
    pub async fn log(&self, draft: EventDraft) {
        let severity = Severity::derive(draft.kind, draft.success);
        let risk_score = self.scorer.score(
            draft.kind,
            draft.success,
            draft.user_agent.as_deref(),
            draft.attempt_count,
        );

        let event = SecurityEvent {
            id: Uuid::new_v4(),
            kind: draft.kind,
            severity,
            success: draft.success,
            user_id: draft.user_id,
            email: draft.email,
            ip_address: draft.ip_address,
            user_agent: draft.user_agent,
            details: draft.details,
            risk_score,
            occurred_at: Utc::now(),
        };

        match severity {
            Severity::Low => info!(
                kind = %event.kind,
                success = event.success,
                risk = event.risk_score,
                "security event"
            ),
            Severity::Medium | Severity::High => warn!(
                kind = %event.kind,
                severity = %event.severity,
                success = event.success,
                risk = event.risk_score,
                "security event"
            ),
        }

        if risk_score >= self.high_risk_threshold {
            self.hook.escalate(&event);
        }

        // Best effort: the primary operation never fails because the
        // audit sink did.
        if let Err(e) = self.sink.append(event).await {
            warn!(error = %e, "Failed to append security event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use openpoll_core::traits::audit::NoopEscalation;

    use super::*;
    use crate::audit::memory::MemoryEventSink;

    #[derive(Debug, Default)]
    struct CountingHook {
        escalated: Mutex<Vec<u8>>,
    }

    impl EscalationHook for CountingHook {
        fn escalate(&self, event: &SecurityEvent) {
            self.escalated.lock().unwrap().push(event.risk_score);
        }
    }

    #[tokio::test]
    async fn logged_event_carries_derived_severity_and_risk() {
        let sink = Arc::new(MemoryEventSink::new());
        let logger = SecurityLogger::new(
            sink.clone(),
            SecurityConfig::default(),
            Arc::new(NoopEscalation),
        );

        logger
            .log(EventDraft::new(SecurityEventKind::RateLimitExceeded, false).email("A@b.c"))
            .await;

        let events = sink.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].risk_score, 50 + 15);
        assert_eq!(events[0].email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn high_risk_events_escalate() {
        let sink = Arc::new(MemoryEventSink::new());
        let hook = Arc::new(CountingHook::default());
        let logger = SecurityLogger::new(sink, SecurityConfig::default(), hook.clone());

        // 55 + 15 = 70, exactly at the threshold.
        logger
            .log(EventDraft::new(SecurityEventKind::CsrfValidationFailure, false))
            .await;
        // 5, well below.
        logger
            .log(EventDraft::new(SecurityEventKind::LoginSuccess, true))
            .await;

        assert_eq!(*hook.escalated.lock().unwrap(), vec![70]);
    }
}
