//! Rate-limited action labels and their configured rules.

use openpoll_core::config::rate_limit::{RateLimitConfig, RateLimitRule};

/// The actions subject to rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    /// Sign-in attempt, keyed by lowercased email.
    Login,
    /// Lockout-grade sign-in throttle, keyed by lowercased email.
    /// Counted separately from `Login` with a longer window.
    LoginLockout,
    /// Registration attempt, keyed by lowercased email.
    Register,
    /// Password reset request, keyed by lowercased email.
    PasswordReset,
    /// Poll creation, keyed by user id.
    CreatePoll,
    /// Vote submission, keyed by user id or browsing context.
    Vote,
    /// Poll deletion, keyed by user id.
    DeletePoll,
}

impl RateLimitAction {
    /// Stable label used in store keys and event details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::LoginLockout => "login_lockout",
            Self::Register => "register",
            Self::PasswordReset => "password_reset",
            Self::CreatePoll => "create_poll",
            Self::Vote => "vote",
            Self::DeletePoll => "delete_poll",
        }
    }

    /// The configured rule for this action.
    pub fn rule(&self, config: &RateLimitConfig) -> RateLimitRule {
        match self {
            Self::Login => config.login,
            Self::LoginLockout => config.login_lockout,
            Self::Register => config.register,
            Self::PasswordReset => config.password_reset,
            Self::CreatePoll => config.create_poll,
            Self::Vote => config.vote,
            Self::DeletePoll => config.delete_poll,
        }
    }
}

impl std::fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
