//! Sliding-window attempt counting against the key-value store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use openpoll_cache::{CacheManager, keys};
use openpoll_core::config::rate_limit::{RateLimitConfig, RateLimitRule};
use openpoll_core::events::SecurityEventKind;
use openpoll_core::result::AppResult;
use openpoll_core::traits::kv::KeyValueStore;

use crate::audit::{EventDraft, SecurityLogger};

use super::policy::RateLimitAction;

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the attempt is allowed.
    pub allowed: bool,
    /// Attempts left before the limit trips.
    pub remaining: u32,
    /// When the current window closes and the counter resets.
    pub reset_at: DateTime<Utc>,
}

/// Counts attempts per `(identity, action)` pair inside a sliding
/// window persisted in the injected key-value store.
///
/// The counter is advanced with the store's atomic increment, so
/// concurrent checks against a shared backend never undercount. A store
/// failure fails OPEN by default: a key-value outage must not lock out
/// legitimate users, though it also suspends brute-force protection
/// while it lasts. The outage itself is always logged.
#[derive(Clone)]
pub struct RateLimiter {
    /// Counter persistence.
    store: CacheManager,
    /// Per-action rules.
    config: RateLimitConfig,
    /// Security event logger for denials and store failures.
    logger: Arc<SecurityLogger>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish()
    }
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(store: CacheManager, config: RateLimitConfig, logger: Arc<SecurityLogger>) -> Self {
        Self {
            store,
            config,
            logger,
        }
    }

    /// Checks the attempt against the action's configured rule.
    pub async fn check(&self, identity: &str, action: RateLimitAction) -> RateDecision {
        let rule = action.rule(&self.config);
        self.check_with(identity, action, rule).await
    }

    /// Checks the attempt against an explicit rule.
    pub async fn check_with(
        &self,
        identity: &str,
        action: RateLimitAction,
        rule: RateLimitRule,
    ) -> RateDecision {
        let window = Duration::from_secs(rule.window_seconds);

        if !self.config.enabled {
            return RateDecision {
                allowed: true,
                remaining: rule.max_attempts,
                reset_at: Utc::now() + chrono::Duration::from_std(window).unwrap_or_default(),
            };
        }

        match self.try_check(identity, action, rule).await {
            Ok(decision) => {
                if !decision.allowed {
                    let attempts = rule.max_attempts.saturating_add(1);
                    self.logger
                        .log(
                            EventDraft::new(SecurityEventKind::RateLimitExceeded, false)
                                .details(serde_json::json!({
                                    "action": action.as_str(),
                                    "identity": identity,
                                    "max_attempts": rule.max_attempts,
                                }))
                                .attempts(attempts),
                        )
                        .await;
                }
                decision
            }
            Err(e) => {
                warn!(
                    action = %action,
                    error = %e,
                    fail_open = self.config.fail_open,
                    "Rate limit store failure"
                );
                self.logger
                    .log(
                        EventDraft::new(SecurityEventKind::StorageFailure, false).details(
                            serde_json::json!({
                                "component": "rate_limiter",
                                "action": action.as_str(),
                            }),
                        ),
                    )
                    .await;

                RateDecision {
                    allowed: self.config.fail_open,
                    remaining: if self.config.fail_open {
                        rule.max_attempts
                    } else {
                        0
                    },
                    reset_at: Utc::now() + chrono::Duration::from_std(window).unwrap_or_default(),
                }
            }
        }
    }

    /// Reads the current attempt count without incrementing it.
    pub async fn attempts(&self, identity: &str, action: RateLimitAction) -> AppResult<u32> {
        let counter_key = keys::rate_counter(action.as_str(), identity);
        let count = self
            .store
            .get(&counter_key)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(count.max(0) as u32)
    }

    /// Clears the counter for an `(identity, action)` pair. Called after
    /// a successful privileged action such as authentication.
    pub async fn reset(&self, identity: &str, action: RateLimitAction) {
        let counter_key = keys::rate_counter(action.as_str(), identity);
        let window_key = keys::rate_window(action.as_str(), identity);
        if let Err(e) = self.store.delete(&counter_key).await {
            warn!(action = %action, error = %e, "Failed to reset rate counter");
        }
        if let Err(e) = self.store.delete(&window_key).await {
            warn!(action = %action, error = %e, "Failed to reset rate window key");
        }
    }

    async fn try_check(
        &self,
        identity: &str,
        action: RateLimitAction,
        rule: RateLimitRule,
    ) -> AppResult<RateDecision> {
        let window = Duration::from_secs(rule.window_seconds);
        let counter_key = keys::rate_counter(action.as_str(), identity);
        let window_key = keys::rate_window(action.as_str(), identity);

        // One store round trip arms the window atomically with the
        // first increment; concurrent checks cannot leave an unexpiring
        // counter behind.
        let count = self.store.incr_with_ttl(&counter_key, window).await?;

        if count == 1 {
            // Remember the window start for reset-time reporting.
            self.store
                .set(
                    &window_key,
                    &Utc::now().timestamp_millis().to_string(),
                    window,
                )
                .await?;
        }

        let window_start = self
            .store
            .get(&window_key)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        let reset_at = window_start + chrono::Duration::from_std(window).unwrap_or_default();
        let allowed = count <= i64::from(rule.max_attempts);
        let remaining = u32::try_from(i64::from(rule.max_attempts) - count.max(0))
            .unwrap_or(0);

        Ok(RateDecision {
            allowed,
            remaining,
            reset_at,
        })
    }
}
