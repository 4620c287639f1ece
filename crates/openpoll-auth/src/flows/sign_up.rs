//! Registration flow.

use validator::ValidateEmail;

use openpoll_core::error::ErrorKind;
use openpoll_core::events::SecurityEventKind;

use crate::rate_limit::RateLimitAction;

use super::{
    AuthFlows, FlowOutcome, MSG_SECURITY_VERIFICATION, MSG_TOO_MANY_ATTEMPTS, MSG_TRY_AGAIN,
    RequestContext, normalize_email,
};

/// Fixed text for an email the provider reports as taken. Confirming
/// existence here is an accepted trade-off; sign-in and password reset
/// stay non-committal.
const MSG_ALREADY_REGISTERED: &str = "An account with this email already exists";

/// Registration form fields as submitted.
#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub csrf_token: String,
}

impl AuthFlows {
    /// Registers a new account.
    pub async fn sign_up(&self, ctx: &RequestContext, form: SignUpForm) -> FlowOutcome {
        let email = normalize_email(&form.email);
        if !email.validate_email() {
            return FlowOutcome::fail("Please enter a valid email address");
        }
        if let Err(e) = self.policy.validate(&form.password) {
            return FlowOutcome::fail(e.message);
        }
        let display_name = form.display_name.trim();
        if display_name.is_empty() {
            return FlowOutcome::fail("Please enter your name");
        }

        self.logger
            .log(
                self.draft(SecurityEventKind::SignupAttempt, true, ctx)
                    .email(&email),
            )
            .await;

        let decision = self.limiter.check(&email, RateLimitAction::Register).await;
        if !decision.allowed {
            return FlowOutcome::fail(MSG_TOO_MANY_ATTEMPTS);
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return FlowOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let metadata = serde_json::json!({ "display_name": display_name });
        match self.provider.sign_up(&email, &form.password, metadata).await {
            Ok(user) => {
                self.logger
                    .log(
                        self.draft(SecurityEventKind::SignupSuccess, true, ctx)
                            .user(user.id)
                            .email(&email),
                    )
                    .await;
                FlowOutcome::ok()
            }
            Err(e) if e.kind == ErrorKind::Conflict => {
                self.logger
                    .log(
                        self.draft(SecurityEventKind::SignupFailure, false, ctx)
                            .email(&email)
                            .details(serde_json::json!({ "reason": "already_registered" })),
                    )
                    .await;
                FlowOutcome::fail(MSG_ALREADY_REGISTERED)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-up provider failure");
                self.logger
                    .log(
                        self.draft(SecurityEventKind::SignupFailure, false, ctx)
                            .email(&email)
                            .details(serde_json::json!({ "reason": "provider_error" })),
                    )
                    .await;
                FlowOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }
}
