//! Poll storage trait — the narrow query capability the authorization
//! checker and vote flow need from the hosting application's database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;

/// Data required to create a new poll.
#[derive(Debug, Clone)]
pub struct NewPoll {
    /// The poll question.
    pub question: String,
    /// The answer options, in display order.
    pub options: Vec<String>,
    /// The creating user.
    pub owner_id: Uuid,
}

/// Row-level poll storage consumed by authorization and vote checks.
///
/// Mutations (`update_poll`, `delete_poll`) are only ever invoked after
/// the authorization checker has passed; implementations may enforce
/// row-level rules of their own on top.
#[async_trait]
pub trait PollStore: Send + Sync + std::fmt::Debug + 'static {
    /// The owner of a poll, or `None` if the poll does not exist.
    async fn poll_owner(&self, poll_id: Uuid) -> AppResult<Option<Uuid>>;

    /// The option ids belonging to a poll. Empty if the poll does not
    /// exist.
    async fn poll_options(&self, poll_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Whether the given user has already voted on the poll.
    async fn has_vote(&self, poll_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Record a vote. `user_id` is `None` for anonymous votes.
    async fn insert_vote(
        &self,
        poll_id: Uuid,
        option_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<()>;

    /// Create a poll, returning its id.
    async fn create_poll(&self, poll: &NewPoll) -> AppResult<Uuid>;

    /// Update a poll's question text.
    async fn update_poll(&self, poll_id: Uuid, question: &str) -> AppResult<()>;

    /// Delete a poll and its votes.
    async fn delete_poll(&self, poll_id: Uuid) -> AppResult<()>;
}
