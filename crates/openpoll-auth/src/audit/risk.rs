//! Risk scoring for security events.

use regex::Regex;

use openpoll_core::config::security::SecurityConfig;
use openpoll_core::events::SecurityEventKind;

/// Base score applied when an event kind is absent from the config table.
const UNLISTED_KIND_SCORE: u8 = 10;

/// Computes a 0..=100 risk score for a security event.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    /// Scoring parameters.
    config: SecurityConfig,
    /// Request signatures of known automation tooling.
    automation: Regex,
}

impl RiskScorer {
    /// Creates a scorer from configuration.
    pub fn new(config: SecurityConfig) -> Self {
        // The pattern is fixed; only the bonus it triggers is configurable.
        let automation = Regex::new(
            r"(?i)(curl|wget|python-requests|python-urllib|go-http-client|libwww|httpclient|okhttp|bot|crawler|spider|scrapy|headless|phantomjs|selenium|puppeteer)",
        )
        .expect("automation pattern is valid");

        Self { config, automation }
    }

    /// Scores an event.
    ///
    /// Base score per kind, +`failure_risk_bonus` on failure,
    /// +`automation_risk_bonus` when the user agent looks automated,
    /// +`repeat_attempt_risk_step` per attempt beyond the first (capped),
    /// clamped to 0..=100.
    pub fn score(
        &self,
        kind: SecurityEventKind,
        success: bool,
        user_agent: Option<&str>,
        attempt_count: Option<u32>,
    ) -> u8 {
        let mut score = u32::from(
            *self
                .config
                .base_risk_scores
                .get(kind.as_str())
                .unwrap_or(&UNLISTED_KIND_SCORE),
        );

        if !success {
            score += u32::from(self.config.failure_risk_bonus);
        }

        if user_agent.is_some_and(|ua| self.automation.is_match(ua)) {
            score += u32::from(self.config.automation_risk_bonus);
        }

        if let Some(attempts) = attempt_count {
            let repeats = attempts.saturating_sub(1);
            let contribution = repeats
                .saturating_mul(u32::from(self.config.repeat_attempt_risk_step))
                .min(u32::from(self.config.repeat_attempt_risk_cap));
            score += contribution;
        }

        score.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> RiskScorer {
        RiskScorer::new(SecurityConfig::default())
    }

    #[test]
    fn success_scores_base_only() {
        let score = scorer().score(SecurityEventKind::LoginSuccess, true, None, None);
        assert_eq!(score, 5);
    }

    #[test]
    fn failure_adds_fifteen() {
        let score = scorer().score(SecurityEventKind::LoginFailure, false, None, None);
        assert_eq!(score, 25 + 15);
    }

    #[test]
    fn automation_user_agent_adds_twenty_five() {
        let human = scorer().score(
            SecurityEventKind::LoginFailure,
            false,
            Some("Mozilla/5.0 (X11; Linux x86_64)"),
            None,
        );
        let robot = scorer().score(
            SecurityEventKind::LoginFailure,
            false,
            Some("curl/8.4.0"),
            None,
        );
        assert_eq!(robot, human + 25);
    }

    #[test]
    fn repeat_attempts_scale_and_cap() {
        let one = scorer().score(SecurityEventKind::LoginFailure, false, None, Some(1));
        let three = scorer().score(SecurityEventKind::LoginFailure, false, None, Some(3));
        assert_eq!(three, one + 10);

        let many = scorer().score(SecurityEventKind::LoginFailure, false, None, Some(50));
        assert_eq!(many, one + 20);
    }

    #[test]
    fn score_clamps_at_one_hundred() {
        let score = scorer().score(
            SecurityEventKind::CsrfValidationFailure,
            false,
            Some("python-requests/2.31"),
            Some(20),
        );
        assert_eq!(score, 100);
    }
}
