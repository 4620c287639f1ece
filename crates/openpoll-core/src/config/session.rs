//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session lifecycle configuration for the client-resident monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long before expiry the user-facing warning fires, in seconds.
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold_seconds: u64,
    /// Interval between proactive session refreshes, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Maximum number of refresh retries before giving up.
    #[serde(default = "default_max_retries")]
    pub max_refresh_retries: u32,
    /// Base delay for exponential refresh backoff, in milliseconds.
    #[serde(default = "default_backoff_base")]
    pub retry_backoff_base_ms: u64,
    /// Upper bound on the refresh backoff delay, in milliseconds.
    #[serde(default = "default_backoff_cap")]
    pub retry_backoff_cap_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warning_threshold_seconds: default_warning_threshold(),
            refresh_interval_seconds: default_refresh_interval(),
            max_refresh_retries: default_max_retries(),
            retry_backoff_base_ms: default_backoff_base(),
            retry_backoff_cap_ms: default_backoff_cap(),
        }
    }
}

impl SessionConfig {
    /// Backoff delay in milliseconds for the given retry attempt.
    pub fn backoff_ms(&self, retry_count: u32) -> u64 {
        let exp = self
            .retry_backoff_base_ms
            .saturating_mul(1u64 << retry_count.min(16));
        exp.min(self.retry_backoff_cap_ms)
    }
}

fn default_warning_threshold() -> u64 {
    300
}

fn default_refresh_interval() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1_000
}

fn default_backoff_cap() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = SessionConfig::default();
        assert_eq!(config.backoff_ms(0), 1_000);
        assert_eq!(config.backoff_ms(1), 2_000);
        assert_eq!(config.backoff_ms(2), 4_000);
        assert_eq!(config.backoff_ms(10), 30_000);
    }
}
