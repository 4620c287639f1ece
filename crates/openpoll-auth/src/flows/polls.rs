//! Poll create, update, and delete flows.

use uuid::Uuid;

use openpoll_core::traits::polls::NewPoll;

use crate::authz::PollAction;
use crate::rate_limit::RateLimitAction;

use super::{
    AuthFlows, FlowOutcome, MSG_PERMISSION_DENIED, MSG_SECURITY_VERIFICATION,
    MSG_TOO_MANY_ATTEMPTS, MSG_TRY_AGAIN, RequestContext, parse_uuid,
};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;

/// Poll creation form fields as submitted.
#[derive(Debug, Clone)]
pub struct CreatePollForm {
    pub question: String,
    pub options: Vec<String>,
    pub csrf_token: String,
}

/// Poll edit form fields as submitted.
#[derive(Debug, Clone)]
pub struct UpdatePollForm {
    pub poll_id: String,
    pub question: String,
    pub csrf_token: String,
}

/// Poll deletion form fields as submitted.
#[derive(Debug, Clone)]
pub struct DeletePollForm {
    pub poll_id: String,
    pub csrf_token: String,
}

/// Poll creation result as rendered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePollOutcome {
    /// The new poll's id on success.
    pub poll_id: Option<Uuid>,
    /// User-safe error text on failure.
    pub error: Option<String>,
}

impl CreatePollOutcome {
    fn created(poll_id: Uuid) -> Self {
        Self {
            poll_id: Some(poll_id),
            error: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            poll_id: None,
            error: Some(message.to_string()),
        }
    }
}

impl AuthFlows {
    /// Creates a poll owned by the signed-in user.
    pub async fn create_poll(
        &self,
        ctx: &RequestContext,
        form: CreatePollForm,
    ) -> CreatePollOutcome {
        let question = form.question.trim();
        if question.is_empty() {
            return CreatePollOutcome::fail("Please enter a question");
        }
        let options: Vec<String> = form
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if options.len() < MIN_OPTIONS {
            return CreatePollOutcome::fail("A poll needs at least two options");
        }
        if options.len() > MAX_OPTIONS {
            return CreatePollOutcome::fail("A poll can have at most ten options");
        }

        let Some(user) = self.current_user().await else {
            return CreatePollOutcome::fail(MSG_PERMISSION_DENIED);
        };

        let decision = self
            .limiter
            .check(&user.id.to_string(), RateLimitAction::CreatePoll)
            .await;
        if !decision.allowed {
            return CreatePollOutcome::fail(MSG_TOO_MANY_ATTEMPTS);
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return CreatePollOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let new_poll = NewPoll {
            question: question.to_string(),
            options,
            owner_id: user.id,
        };
        match self.polls.create_poll(&new_poll).await {
            Ok(poll_id) => CreatePollOutcome::created(poll_id),
            Err(e) => {
                tracing::warn!(error = %e, "Poll creation failed");
                CreatePollOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }

    /// Updates a poll's question. Owner only.
    pub async fn update_poll(&self, ctx: &RequestContext, form: UpdatePollForm) -> FlowOutcome {
        let Some(poll_id) = parse_uuid(&form.poll_id) else {
            return FlowOutcome::fail("Invalid poll");
        };
        let question = form.question.trim();
        if question.is_empty() {
            return FlowOutcome::fail("Please enter a question");
        }

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return FlowOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let actor = self.current_user().await.map(|u| u.id);
        match self
            .authorizer
            .is_action_authorized(PollAction::Edit, poll_id, actor)
            .await
        {
            Ok(true) => {}
            Ok(false) => return FlowOutcome::fail(MSG_PERMISSION_DENIED),
            Err(e) => {
                tracing::warn!(error = %e, "Edit authorization check failed");
                return FlowOutcome::fail(MSG_TRY_AGAIN);
            }
        }

        match self.polls.update_poll(poll_id, question).await {
            Ok(()) => FlowOutcome::ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Poll update failed");
                FlowOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }

    /// Deletes a poll and its votes. Owner only.
    pub async fn delete_poll(&self, ctx: &RequestContext, form: DeletePollForm) -> FlowOutcome {
        let Some(poll_id) = parse_uuid(&form.poll_id) else {
            return FlowOutcome::fail("Invalid poll");
        };

        if !self
            .csrf
            .validate_and_rotate(&ctx.context_id, &form.csrf_token)
            .await
        {
            return FlowOutcome::fail(MSG_SECURITY_VERIFICATION);
        }

        let actor = self.current_user().await.map(|u| u.id);
        match self
            .authorizer
            .is_action_authorized(PollAction::Delete, poll_id, actor)
            .await
        {
            Ok(true) => {}
            Ok(false) => return FlowOutcome::fail(MSG_PERMISSION_DENIED),
            Err(e) => {
                tracing::warn!(error = %e, "Delete authorization check failed");
                return FlowOutcome::fail(MSG_TRY_AGAIN);
            }
        }

        let Some(owner) = actor else {
            return FlowOutcome::fail(MSG_PERMISSION_DENIED);
        };
        let decision = self
            .limiter
            .check(&owner.to_string(), RateLimitAction::DeletePoll)
            .await;
        if !decision.allowed {
            return FlowOutcome::fail(MSG_TOO_MANY_ATTEMPTS);
        }

        match self.polls.delete_poll(poll_id).await {
            Ok(()) => FlowOutcome::ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Poll deletion failed");
                FlowOutcome::fail(MSG_TRY_AGAIN)
            }
        }
    }
}
