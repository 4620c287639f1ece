//! Sign-out flow.

use openpoll_core::events::SecurityEventKind;

use super::{AuthFlows, FlowOutcome, RequestContext};

impl AuthFlows {
    /// Signs the current user out.
    ///
    /// Always succeeds from the caller's perspective: a provider or
    /// audit failure is logged but never blocks the UI transition to
    /// the signed-out state.
    pub async fn sign_out(&self, ctx: &RequestContext) -> FlowOutcome {
        // Best effort, for the audit record only.
        let user = self.current_user().await;

        let result = self.provider.sign_out().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }

        let mut draft = self.draft(SecurityEventKind::Logout, result.is_ok(), ctx);
        if let Some(user) = user {
            draft = draft.user(user.id).email(&user.email);
        }
        self.logger.log(draft).await;

        FlowOutcome::ok()
    }
}
