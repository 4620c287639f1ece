//! Action-level authorization over poll ownership.

use std::sync::Arc;

use uuid::Uuid;

use openpoll_core::config::auth::AuthConfig;
use openpoll_core::events::SecurityEventKind;
use openpoll_core::result::AppResult;
use openpoll_core::traits::polls::PollStore;

use crate::audit::{EventDraft, SecurityLogger};

/// What a caller is trying to do to a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Read the poll and its results.
    View,
    /// Cast a vote.
    Vote,
    /// Change the poll's content.
    Edit,
    /// Remove the poll.
    Delete,
}

impl PollAction {
    /// Stable label for event details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Vote => "vote",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PollAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an actor may perform an action on a poll.
///
/// Polls are public to view. Mutation requires ownership, resolved
/// against the poll store at check time; an unresolvable poll or a
/// missing actor denies (fail closed). Denials are logged with actor
/// and resource ids only, never resource content.
pub struct PollAuthorizer {
    polls: Arc<dyn PollStore>,
    logger: Arc<SecurityLogger>,
    allow_anonymous_votes: bool,
}

impl std::fmt::Debug for PollAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollAuthorizer")
            .field("allow_anonymous_votes", &self.allow_anonymous_votes)
            .finish()
    }
}

impl PollAuthorizer {
    /// Creates a new authorizer.
    pub fn new(
        polls: Arc<dyn PollStore>,
        logger: Arc<SecurityLogger>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            polls,
            logger,
            allow_anonymous_votes: config.allow_anonymous_votes,
        }
    }

    /// Checks whether `actor` may perform `action` on `poll_id`.
    ///
    /// Returns `Err` only on a store failure; a deny is `Ok(false)`.
    pub async fn is_action_authorized(
        &self,
        action: PollAction,
        poll_id: Uuid,
        actor: Option<Uuid>,
    ) -> AppResult<bool> {
        let allowed = match action {
            PollAction::View => true,
            PollAction::Vote => actor.is_some() || self.allow_anonymous_votes,
            PollAction::Edit | PollAction::Delete => match (actor, self.polls.poll_owner(poll_id).await?) {
                (Some(actor_id), Some(owner_id)) => actor_id == owner_id,
                _ => false,
            },
        };

        if !allowed {
            let mut draft = EventDraft::new(SecurityEventKind::AuthorizationDenied, false)
                .details(serde_json::json!({
                    "action": action.as_str(),
                    "poll_id": poll_id,
                }));
            if let Some(actor_id) = actor {
                draft = draft.user(actor_id);
            }
            self.logger.log(draft).await;
        }

        Ok(allowed)
    }
}
