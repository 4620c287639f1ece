//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Whether votes from unauthenticated visitors are accepted.
    ///
    /// Anonymous votes carry no identity, so duplicate-vote prevention
    /// does not apply to them.
    #[serde(default = "default_true")]
    pub allow_anonymous_votes: bool,
    /// TTL in seconds for stored anti-forgery tokens. Matches the
    /// lifetime of the browsing context they protect.
    #[serde(default = "default_csrf_ttl")]
    pub csrf_token_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_min_length: default_password_min(),
            allow_anonymous_votes: true,
            csrf_token_ttl_seconds: default_csrf_ttl(),
        }
    }
}

fn default_password_min() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_csrf_ttl() -> u64 {
    // 12 hours, the upper bound of a browsing session.
    43_200
}
