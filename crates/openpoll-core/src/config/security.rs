//! Security event and risk scoring configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Risk scoring and escalation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Risk score at or above which the escalation hook fires.
    #[serde(default = "default_high_risk_threshold")]
    pub high_risk_threshold: u8,
    /// Base risk score per event kind. Key is the event kind label
    /// (e.g. `"login_failure"`). Kinds absent from the table score 10.
    #[serde(default = "default_base_risk_scores")]
    pub base_risk_scores: HashMap<String, u8>,
    /// Added to the score when the event records a failure.
    #[serde(default = "default_failure_bonus")]
    pub failure_risk_bonus: u8,
    /// Added when the request signature matches a known automation
    /// pattern (curl, headless browsers, crawlers).
    #[serde(default = "default_automation_bonus")]
    pub automation_risk_bonus: u8,
    /// Added per repeated attempt beyond the first.
    #[serde(default = "default_repeat_step")]
    pub repeat_attempt_risk_step: u8,
    /// Upper bound on the repeated-attempt contribution.
    #[serde(default = "default_repeat_cap")]
    pub repeat_attempt_risk_cap: u8,
    /// How many top-risk events the reporting read path returns.
    #[serde(default = "default_top_risk_limit")]
    pub top_risk_limit: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            high_risk_threshold: default_high_risk_threshold(),
            base_risk_scores: default_base_risk_scores(),
            failure_risk_bonus: default_failure_bonus(),
            automation_risk_bonus: default_automation_bonus(),
            repeat_attempt_risk_step: default_repeat_step(),
            repeat_attempt_risk_cap: default_repeat_cap(),
            top_risk_limit: default_top_risk_limit(),
        }
    }
}

fn default_high_risk_threshold() -> u8 {
    70
}

fn default_failure_bonus() -> u8 {
    15
}

fn default_automation_bonus() -> u8 {
    25
}

fn default_repeat_step() -> u8 {
    5
}

fn default_repeat_cap() -> u8 {
    20
}

fn default_top_risk_limit() -> usize {
    10
}

fn default_base_risk_scores() -> HashMap<String, u8> {
    let mut map = HashMap::new();
    map.insert("login_attempt".to_string(), 10);
    map.insert("login_failure".to_string(), 25);
    map.insert("login_success".to_string(), 5);
    map.insert("signup_attempt".to_string(), 10);
    map.insert("signup_failure".to_string(), 20);
    map.insert("signup_success".to_string(), 5);
    map.insert("logout".to_string(), 0);
    map.insert("password_reset_request".to_string(), 15);
    map.insert("password_reset_complete".to_string(), 10);
    map.insert("rate_limit_exceeded".to_string(), 50);
    map.insert("csrf_validation_failure".to_string(), 55);
    map.insert("authorization_denied".to_string(), 40);
    map.insert("vote_rejected".to_string(), 20);
    map.insert("storage_failure".to_string(), 30);
    map
}
