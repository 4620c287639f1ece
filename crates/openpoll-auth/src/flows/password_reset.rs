//! Password reset flows: the email request and the token completion.

use validator::ValidateEmail;

use openpoll_core::events::SecurityEventKind;

use crate::rate_limit::RateLimitAction;

use super::{
    AuthFlows, FlowOutcome, MSG_SECURITY_VERIFICATION, MSG_TOO_MANY_ATTEMPTS, RequestContext,
    normalize_email,
};

const MSG_RESET_LINK_INVALID: &str = "This reset link is invalid or has expired";

/// Reset request form fields as submitted.
#[derive(Debug, Clone)]
pub struct ResetRequestForm {
    pub email: String,
    pub csrf_token: String,
}

/// Reset completion form fields as submitted.
#[derive(Debug, Clone)]
pub struct ResetCompleteForm {
    pub token: String,
    pub new_password: String,
    pub csrf_token: String,
}

/// Result of a reset request as rendered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Whether the user should be told an email is on its way.
    pub email_sent: bool,
    /// User-safe error text for local validation failures only.
    pub error: Option<String>,
}

impl ResetOutcome {
    fn sent() -> Self {
        Self {
            email_sent: true,
            error: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            email_sent: false,
            error: Some(message.to_string()),
        }
    }
}

impl AuthFlows {
    /// Requests a password-reset email.
    ///
    /// Existing account, unknown account, and provider failure all
    /// produce the identical `email_sent: true` outcome, so the
    /// response cannot be used to probe which emails are registered.
    /// Failures are logged server-side only.
    pub async fn request_password_reset(
        &self,
        ctx: &RequestContext,
        form: ResetRequestForm,
    ) -> ResetOutcome {
        let email = normalize_email(&form.email);
        if !email.validate_email() {
            return ResetOutcome::fail("Please enter a valid email address");
        }

        let decision = self
            .limiter
            .check(&email, RateLimitAction::PasswordReset)
            .await;
        if !decision.allowed {
            return ResetOutcome::fail(MSG_TOO_MANY_ATTEMPTS);
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return ResetOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let result = self.provider.reset_password_for_email(&email).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Reset email dispatch failed");
        }
        self.logger
            .log(
                self.draft(SecurityEventKind::PasswordResetRequest, result.is_ok(), ctx)
                    .email(&email),
            )
            .await;

        ResetOutcome::sent()
    }

    /// Completes a password reset with an emailed token.
    ///
    /// The token is single-use: the provider consumes it on successful
    /// verification. Token errors are collapsed into one message.
    pub async fn complete_password_reset(
        &self,
        ctx: &RequestContext,
        form: ResetCompleteForm,
    ) -> FlowOutcome {
        if form.token.trim().is_empty() {
            return FlowOutcome::fail(MSG_RESET_LINK_INVALID);
        }
        if let Err(e) = self.policy.validate(&form.new_password) {
            return FlowOutcome::fail(e.message);
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return FlowOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let user = match self.provider.verify_reset_token(form.token.trim()).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Reset token rejected");
                self.logger
                    .log(
                        self.draft(SecurityEventKind::PasswordResetComplete, false, ctx)
                            .details(serde_json::json!({ "reason": "invalid_token" })),
                    )
                    .await;
                return FlowOutcome::fail(MSG_RESET_LINK_INVALID);
            }
        };

        match self.provider.update_password(&form.new_password).await {
            Ok(()) => {
                self.logger
                    .log(
                        self.draft(SecurityEventKind::PasswordResetComplete, true, ctx)
                            .user(user.id)
                            .email(&user.email),
                    )
                    .await;
                FlowOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Password update failed");
                self.logger
                    .log(
                        self.draft(SecurityEventKind::PasswordResetComplete, false, ctx)
                            .user(user.id)
                            .email(&user.email)
                            .details(serde_json::json!({ "reason": "update_failed" })),
                    )
                    .await;
                FlowOutcome::fail(super::MSG_TRY_AGAIN)
            }
        }
    }
}
