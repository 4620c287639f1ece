//! Per-context anti-forgery tokens backed by the key-value store.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use tracing::warn;

use openpoll_cache::keys;
use openpoll_cache::provider::CacheManager;
use openpoll_core::config::auth::AuthConfig;
use openpoll_core::events::SecurityEventKind;
use openpoll_core::result::AppResult;
use openpoll_core::traits::kv::KeyValueStore;

use crate::audit::{EventDraft, SecurityLogger};

const TOKEN_BYTES: usize = 32;

/// Issues and validates single-use anti-forgery tokens.
///
/// One token is live per context at a time. Validation and reissue are
/// a single call, so from the caller's perspective there is never a
/// window with zero or two valid tokens.
pub struct CsrfGuard {
    store: CacheManager,
    logger: Arc<SecurityLogger>,
    ttl: Duration,
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard").field("ttl", &self.ttl).finish()
    }
}

impl CsrfGuard {
    /// Creates a guard with the configured token lifetime.
    pub fn new(store: CacheManager, logger: Arc<SecurityLogger>, config: &AuthConfig) -> Self {
        Self {
            store,
            logger,
            ttl: Duration::from_secs(config.csrf_token_ttl_seconds),
        }
    }

    /// Issues a fresh token for the context, replacing any existing one.
    pub async fn issue(&self, context_id: &str) -> AppResult<String> {
        let token = generate_token();
        self.store
            .set(&keys::csrf_token(context_id), &token, self.ttl)
            .await?;
        Ok(token)
    }

    /// Validates the submitted token against the stored one.
    ///
    /// On a match the stored token is consumed and a replacement is
    /// issued immediately. Any other case, including a store failure
    /// mid-rotation, is a rejection: tampering, expiry, and replay are
    /// indistinguishable to the caller.
    pub async fn validate_and_rotate(&self, context_id: &str, submitted: &str) -> bool {
        if context_id.is_empty() || submitted.is_empty() {
            self.log_failure(context_id, "missing token").await;
            return false;
        }

        let key = keys::csrf_token(context_id);
        let stored = match self.store.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Token lookup failed");
                self.log_failure(context_id, "store unavailable").await;
                return false;
            }
        };

        match stored {
            Some(token) if token == submitted => {
                if let Err(e) = self.store.delete(&key).await {
                    warn!(error = %e, "Token rotation failed");
                    return false;
                }
                match self.issue(context_id).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(error = %e, "Token reissue failed");
                        false
                    }
                }
            }
            _ => {
                self.log_failure(context_id, "token mismatch").await;
                false
            }
        }
    }

    async fn log_failure(&self, context_id: &str, reason: &str) {
        self.logger
            .log(
                EventDraft::new(SecurityEventKind::CsrfValidationFailure, false).details(
                    serde_json::json!({
                        "context_id": context_id,
                        "reason": reason,
                    }),
                ),
            )
            .await;
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use openpoll_cache::memory::MemoryStore;
    use openpoll_core::config::cache::MemoryCacheConfig;
    use openpoll_core::config::security::SecurityConfig;
    use openpoll_core::events::Severity;
    use openpoll_core::traits::audit::NoopEscalation;

    use super::*;
    use crate::audit::MemoryEventSink;

    fn guard_with_sink() -> (CsrfGuard, Arc<MemoryEventSink>) {
        let store = CacheManager::from_store(Arc::new(MemoryStore::new(
            &MemoryCacheConfig::default(),
            300,
        )));
        let sink = Arc::new(MemoryEventSink::new());
        let logger = Arc::new(SecurityLogger::new(
            sink.clone(),
            SecurityConfig::default(),
            Arc::new(NoopEscalation),
        ));
        let guard = CsrfGuard::new(store, logger, &AuthConfig::default());
        (guard, sink)
    }

    #[tokio::test]
    async fn issued_token_validates_exactly_once() {
        let (guard, _) = guard_with_sink();
        let token = guard.issue("sess-1").await.unwrap();

        assert!(guard.validate_and_rotate("sess-1", &token).await);
        // The matched token was consumed and replaced.
        assert!(!guard.validate_and_rotate("sess-1", &token).await);
    }

    #[tokio::test]
    async fn rotation_leaves_a_fresh_valid_token() {
        let (guard, _) = guard_with_sink();
        let token = guard.issue("sess-2").await.unwrap();
        assert!(guard.validate_and_rotate("sess-2", &token).await);

        let replacement = guard
            .store
            .get(&keys::csrf_token("sess-2"))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(replacement, token);
        assert!(guard.validate_and_rotate("sess-2", &replacement).await);
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let (guard, _) = guard_with_sink();
        guard.issue("sess-3").await.unwrap();
        assert!(!guard.validate_and_rotate("sess-3", "").await);
    }

    #[tokio::test]
    async fn mismatch_logs_a_high_severity_event() {
        let (guard, sink) = guard_with_sink();
        guard.issue("sess-4").await.unwrap();
        assert!(!guard.validate_and_rotate("sess-4", "forged").await);

        let events = sink.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SecurityEventKind::CsrfValidationFailure);
        assert_eq!(events[0].severity, Severity::High);
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, base64 without padding
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
