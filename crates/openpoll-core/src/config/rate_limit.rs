//! Per-action rate limit configuration.

use serde::{Deserialize, Serialize};

/// A single rate limit rule: a maximum number of attempts inside a
/// sliding window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Maximum attempts allowed within the window.
    pub max_attempts: u32,
    /// Window duration in seconds.
    pub window_seconds: u64,
}

impl RateLimitRule {
    /// Creates a rule from its two parameters.
    pub const fn new(max_attempts: u32, window_seconds: u64) -> Self {
        Self {
            max_attempts,
            window_seconds,
        }
    }
}

/// Rate limiting configuration with action-specific rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether a store failure is treated as allowed (fail open).
    ///
    /// When true a key-value store outage disables brute-force
    /// protection rather than locking out legitimate users. The outage
    /// itself is always logged.
    #[serde(default = "default_true")]
    pub fail_open: bool,
    /// Sign-in attempts per email.
    #[serde(default = "default_login")]
    pub login: RateLimitRule,
    /// Lockout-grade sign-in throttle per email, checked by the sign-in
    /// flow on top of the generic `login` rule.
    #[serde(default = "default_login_lockout")]
    pub login_lockout: RateLimitRule,
    /// Registration attempts per email.
    #[serde(default = "default_register")]
    pub register: RateLimitRule,
    /// Password reset requests per email.
    #[serde(default = "default_password_reset")]
    pub password_reset: RateLimitRule,
    /// Poll creations per user.
    #[serde(default = "default_create_poll")]
    pub create_poll: RateLimitRule,
    /// Votes per identity.
    #[serde(default = "default_vote")]
    pub vote: RateLimitRule,
    /// Poll deletions per user.
    #[serde(default = "default_delete_poll")]
    pub delete_poll: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_open: true,
            login: default_login(),
            login_lockout: default_login_lockout(),
            register: default_register(),
            password_reset: default_password_reset(),
            create_poll: default_create_poll(),
            vote: default_vote(),
            delete_poll: default_delete_poll(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_login() -> RateLimitRule {
    RateLimitRule::new(5, 300)
}

fn default_login_lockout() -> RateLimitRule {
    RateLimitRule::new(5, 900)
}

fn default_register() -> RateLimitRule {
    RateLimitRule::new(3, 600)
}

fn default_password_reset() -> RateLimitRule {
    RateLimitRule::new(3, 3_600)
}

fn default_create_poll() -> RateLimitRule {
    RateLimitRule::new(10, 3_600)
}

fn default_vote() -> RateLimitRule {
    RateLimitRule::new(30, 3_600)
}

fn default_delete_poll() -> RateLimitRule {
    RateLimitRule::new(15, 3_600)
}
