//! Security event records and severity derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The category of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    /// A sign-in was attempted.
    LoginAttempt,
    /// A sign-in succeeded.
    LoginSuccess,
    /// A sign-in failed.
    LoginFailure,
    /// A registration was attempted.
    SignupAttempt,
    /// A registration succeeded.
    SignupSuccess,
    /// A registration failed.
    SignupFailure,
    /// A user signed out.
    Logout,
    /// A password reset was requested.
    PasswordResetRequest,
    /// A password reset was completed.
    PasswordResetComplete,
    /// A rate limit denied an action.
    RateLimitExceeded,
    /// An anti-forgery token failed validation.
    CsrfValidationFailure,
    /// An authorization check denied an action.
    AuthorizationDenied,
    /// A vote was rejected (duplicate or invalid option).
    VoteRejected,
    /// The backing key-value store or sink failed.
    StorageFailure,
}

impl SecurityEventKind {
    /// Stable label used in logs and the risk score table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginAttempt => "login_attempt",
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::SignupAttempt => "signup_attempt",
            Self::SignupSuccess => "signup_success",
            Self::SignupFailure => "signup_failure",
            Self::Logout => "logout",
            Self::PasswordResetRequest => "password_reset_request",
            Self::PasswordResetComplete => "password_reset_complete",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::CsrfValidationFailure => "csrf_validation_failure",
            Self::AuthorizationDenied => "authorization_denied",
            Self::VoteRejected => "vote_rejected",
            Self::StorageFailure => "storage_failure",
        }
    }
}

impl std::fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a security event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine, successful operation.
    Low,
    /// A failure worth noticing.
    Medium,
    /// A policy violation (rate limit, CSRF, authorization denial).
    High,
}

impl Severity {
    /// Derives severity from the event kind and its success flag.
    pub fn derive(kind: SecurityEventKind, success: bool) -> Self {
        match kind {
            SecurityEventKind::RateLimitExceeded
            | SecurityEventKind::CsrfValidationFailure
            | SecurityEventKind::AuthorizationDenied => Self::High,
            _ if !success => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// An immutable security event record.
///
/// Append-only: the subsystem never mutates or deletes events once
/// written to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// The category of event.
    pub kind: SecurityEventKind,
    /// Derived severity.
    pub severity: Severity,
    /// Whether the underlying operation succeeded.
    pub success: bool,
    /// The acting user, when resolved.
    pub user_id: Option<Uuid>,
    /// The email involved, when relevant (lowercased).
    pub email: Option<String>,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent of the request origin.
    pub user_agent: Option<String>,
    /// Free-form details (JSON).
    pub details: Option<serde_json::Value>,
    /// Computed risk score, clamped to 0..=100.
    pub risk_score: u8,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}
