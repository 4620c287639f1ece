//! Vote submission flow.

use openpoll_core::events::SecurityEventKind;

use crate::authz::PollAction;
use crate::rate_limit::RateLimitAction;

use super::{
    AuthFlows, FlowOutcome, MSG_ALREADY_VOTED, MSG_PERMISSION_DENIED, MSG_SECURITY_VERIFICATION,
    MSG_TOO_MANY_ATTEMPTS, MSG_TRY_AGAIN, RequestContext, parse_uuid,
};

/// Vote form fields as submitted. Ids arrive as strings from the form
/// and are validated here.
#[derive(Debug, Clone)]
pub struct VoteForm {
    pub poll_id: String,
    pub option_id: String,
    pub csrf_token: String,
}

impl AuthFlows {
    /// Casts a vote on a poll.
    ///
    /// Duplicate votes are rejected for authenticated identities.
    /// Anonymous submissions cannot be deduplicated server-side; the
    /// vote rate limit keyed by browsing context is the only brake.
    pub async fn submit_vote(&self, ctx: &RequestContext, form: VoteForm) -> FlowOutcome {
        let Some(poll_id) = parse_uuid(&form.poll_id) else {
            return FlowOutcome::fail("Invalid poll");
        };
        let Some(option_id) = parse_uuid(&form.option_id) else {
            return FlowOutcome::fail("Invalid option");
        };

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return FlowOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let user = self.current_user().await;
        let actor = user.as_ref().map(|u| u.id);

        match self
            .authorizer
            .is_action_authorized(PollAction::Vote, poll_id, actor)
            .await
        {
            Ok(true) => {}
            Ok(false) => return FlowOutcome::fail(MSG_PERMISSION_DENIED),
            Err(e) => {
                tracing::warn!(error = %e, "Vote authorization check failed");
                return FlowOutcome::fail(MSG_TRY_AGAIN);
            }
        }

        let options = match self.polls.poll_options(poll_id).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(error = %e, "Poll option lookup failed");
                return FlowOutcome::fail(MSG_TRY_AGAIN);
            }
        };
        if !options.contains(&option_id) {
            let mut draft = self
                .draft(SecurityEventKind::VoteRejected, false, ctx)
                .details(serde_json::json!({
                    "poll_id": poll_id,
                    "option_id": option_id,
                    "reason": "unknown_option",
                }));
            if let Some(actor_id) = actor {
                draft = draft.user(actor_id);
            }
            self.logger.log(draft).await;
            return FlowOutcome::fail("Invalid option for this poll");
        }

        if let Some(user_id) = actor {
            match self.polls.has_vote(poll_id, user_id).await {
                Ok(true) => {
                    self.logger
                        .log(
                            self.draft(SecurityEventKind::VoteRejected, false, ctx)
                                .user(user_id)
                                .details(serde_json::json!({
                                    "poll_id": poll_id,
                                    "reason": "duplicate_vote",
                                })),
                        )
                        .await;
                    return FlowOutcome::fail(MSG_ALREADY_VOTED);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Duplicate vote check failed");
                    return FlowOutcome::fail(MSG_TRY_AGAIN);
                }
            }
        }

        // Anonymous votes are keyed by browsing context.
        let identity = actor
            .map(|id| id.to_string())
            .unwrap_or_else(|| ctx.context_id.clone());
        let decision = self.limiter.check(&identity, RateLimitAction::Vote).await;
        if !decision.allowed {
            return FlowOutcome::fail(MSG_TOO_MANY_ATTEMPTS);
        }

        match self.polls.insert_vote(poll_id, option_id, actor).await {
            Ok(()) => FlowOutcome::ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Vote insert failed");
                self.logger
                    .log(
                        self.draft(SecurityEventKind::StorageFailure, false, ctx)
                            .details(serde_json::json!({
                                "component": "vote_store",
                                "poll_id": poll_id,
                            })),
                    )
                    .await;
                FlowOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }
}
