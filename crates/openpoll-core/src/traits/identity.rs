//! Identity provider trait — the external collaborator that owns
//! credentials and sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::AppResult;

/// A user identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Provider-assigned user identifier.
    pub id: Uuid,
    /// The user's email address.
    pub email: String,
}

/// A session view as reported by the provider.
///
/// Sessions are minted and owned by the provider; OpenPoll holds only
/// this derived view with bounded staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    /// Opaque access token.
    pub access_token: String,
    /// The authenticated user.
    pub user: ProviderUser,
    /// When the session hard-expires.
    pub expires_at: DateTime<Utc>,
}

/// The hosted identity provider interface consumed by OpenPoll.
///
/// Every method resolves to an [`AppResult`]; the error kind is the
/// sole failure signal this subsystem reacts to. `ErrorKind::
/// Authentication` means invalid credentials, `ErrorKind::Conflict`
/// means an email is already registered.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Verify credentials and mint a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<ProviderSession>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> AppResult<ProviderUser>;

    /// Invalidate the current session.
    async fn sign_out(&self) -> AppResult<()>;

    /// Fetch the current session, if any.
    async fn get_session(&self) -> AppResult<Option<ProviderSession>>;

    /// Fetch the current user, if any.
    async fn get_user(&self) -> AppResult<Option<ProviderUser>>;

    /// Refresh the current session, extending its expiry.
    async fn refresh_session(&self) -> AppResult<ProviderSession>;

    /// Send a password-reset email. The provider decides whether the
    /// account exists; callers must not leak that decision.
    async fn reset_password_for_email(&self, email: &str) -> AppResult<()>;

    /// Verify a password-reset token. Consumes the token on success.
    async fn verify_reset_token(&self, token: &str) -> AppResult<ProviderUser>;

    /// Update the current user's password.
    async fn update_password(&self, new_password: &str) -> AppResult<()>;
}
