//! Sign-in flow.

use validator::ValidateEmail;

use openpoll_core::error::ErrorKind;
use openpoll_core::events::SecurityEventKind;
use openpoll_core::traits::identity::ProviderSession;

use crate::rate_limit::RateLimitAction;

use super::{
    AuthFlows, MSG_INVALID_CREDENTIALS, MSG_SECURITY_VERIFICATION, MSG_TOO_MANY_ATTEMPTS,
    MSG_TRY_AGAIN, RequestContext, normalize_email,
};

/// Sign-in form fields as submitted.
#[derive(Debug, Clone)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

/// Sign-in result as rendered to the user.
#[derive(Debug, Clone, Default)]
pub struct SignInOutcome {
    /// The minted session on success.
    pub session: Option<ProviderSession>,
    /// User-safe error text on failure.
    pub error: Option<String>,
    /// Failed attempts left before the throttle trips, when known.
    pub remaining_attempts: Option<u32>,
}

impl SignInOutcome {
    fn fail(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl AuthFlows {
    /// Authenticates an email/password pair.
    ///
    /// Throttled per lowercased email: failures advance the lockout
    /// counter, success clears it. The error text never reveals
    /// whether the email exists.
    pub async fn sign_in(&self, ctx: &RequestContext, form: SignInForm) -> SignInOutcome {
        let email = normalize_email(&form.email);
        if !email.validate_email() {
            return SignInOutcome::fail("Please enter a valid email address");
        }
        if form.password.is_empty() {
            return SignInOutcome::fail("Please enter your password");
        }

        self.logger
            .log(
                self.draft(SecurityEventKind::LoginAttempt, true, ctx)
                    .email(&email),
            )
            .await;

        let throttle = self.throttle.status(&email).await;
        if throttle.limited {
            return SignInOutcome {
                remaining_attempts: Some(0),
                ..SignInOutcome::fail(MSG_TOO_MANY_ATTEMPTS)
            };
        }
        let decision = self.limiter.check(&email, RateLimitAction::Login).await;
        if !decision.allowed {
            return SignInOutcome {
                remaining_attempts: Some(0),
                ..SignInOutcome::fail(MSG_TOO_MANY_ATTEMPTS)
            };
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return SignInOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        match self
            .provider
            .sign_in_with_password(&email, &form.password)
            .await
        {
            Ok(session) => {
                self.limiter.reset(&email, RateLimitAction::Login).await;
                self.throttle.reset(&email).await;
                self.logger
                    .log(
                        self.draft(SecurityEventKind::LoginSuccess, true, ctx)
                            .user(session.user.id)
                            .email(&email),
                    )
                    .await;
                SignInOutcome {
                    session: Some(session),
                    error: None,
                    remaining_attempts: None,
                }
            }
            Err(e) if e.kind == ErrorKind::Authentication => {
                let status = self.throttle.record_failure(&email).await;
                self.logger
                    .log(
                        self.draft(SecurityEventKind::LoginFailure, false, ctx)
                            .email(&email)
                            .details(serde_json::json!({ "reason": "invalid_credentials" })),
                    )
                    .await;
                SignInOutcome {
                    remaining_attempts: Some(status.remaining_attempts),
                    ..SignInOutcome::fail(MSG_INVALID_CREDENTIALS)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in provider failure");
                self.logger
                    .log(
                        self.draft(SecurityEventKind::LoginFailure, false, ctx)
                            .email(&email)
                            .details(serde_json::json!({ "reason": "provider_error" })),
                    )
                    .await;
                SignInOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }
}
