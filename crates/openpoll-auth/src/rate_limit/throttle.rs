//! Login-specific throttle tracking failed sign-in attempts per email.

use std::sync::Arc;

use tracing::warn;

use super::limiter::RateLimiter;
use super::policy::RateLimitAction;

/// Current throttle state for an email, as shown to the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginThrottleStatus {
    /// Whether further attempts are currently denied.
    pub limited: bool,
    /// Failed attempts left before the throttle trips.
    pub remaining_attempts: u32,
}

/// Lockout-grade sign-in throttle.
///
/// Unlike the generic per-action check, this counter advances only on
/// *failed* attempts and is cleared by a successful authentication, so
/// a legitimate user who eventually signs in starts over with a full
/// allowance.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    /// The shared limiter holding the counters.
    limiter: Arc<RateLimiter>,
    /// Maximum failed attempts within the window.
    max_attempts: u32,
}

impl LoginThrottle {
    /// Creates a throttle over the shared rate limiter.
    pub fn new(limiter: Arc<RateLimiter>, max_attempts: u32) -> Self {
        Self {
            limiter,
            max_attempts,
        }
    }

    /// Reads the throttle state without recording an attempt.
    ///
    /// A store failure reads as unlimited (fail open), consistent with
    /// the limiter itself.
    pub async fn status(&self, email: &str) -> LoginThrottleStatus {
        let count = match self
            .limiter
            .attempts(email, RateLimitAction::LoginLockout)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Login throttle peek failed");
                0
            }
        };

        LoginThrottleStatus {
            limited: count >= self.max_attempts,
            remaining_attempts: self.max_attempts.saturating_sub(count),
        }
    }

    /// Records a failed sign-in attempt and returns the updated state.
    pub async fn record_failure(&self, email: &str) -> LoginThrottleStatus {
        let decision = self
            .limiter
            .check(email, RateLimitAction::LoginLockout)
            .await;

        LoginThrottleStatus {
            limited: !decision.allowed,
            remaining_attempts: decision.remaining,
        }
    }

    /// Clears the counter after a successful authentication.
    pub async fn reset(&self, email: &str) {
        self.limiter
            .reset(email, RateLimitAction::LoginLockout)
            .await;
    }
}
