//! The form-boundary orchestrator.
//!
//! Every mutating form submission flows through the same pipeline:
//! input validation, rate limiting, anti-forgery validation, the
//! provider or storage call, security-event logging, and finally a
//! sanitized outcome. Flow methods never return `Err` across the form
//! boundary; callers render `error` directly as user-facing text.

mod password_reset;
mod polls;
mod sign_in;
mod sign_out;
mod sign_up;
mod vote;

use std::sync::Arc;

use uuid::Uuid;

use openpoll_core::events::SecurityEventKind;
use openpoll_core::traits::identity::{IdentityProvider, ProviderUser};
use openpoll_core::traits::polls::PollStore;

use crate::audit::{EventDraft, SecurityLogger};
use crate::authz::PollAuthorizer;
use crate::csrf::CsrfGuard;
use crate::password::PasswordPolicy;
use crate::rate_limit::{LoginThrottle, RateLimiter};

pub use password_reset::{ResetCompleteForm, ResetOutcome, ResetRequestForm};
pub use polls::{CreatePollForm, CreatePollOutcome, DeletePollForm, UpdatePollForm};
pub use sign_in::{SignInForm, SignInOutcome};
pub use sign_up::SignUpForm;
pub use vote::VoteForm;

/// Generic credential failure. Never distinguishes a wrong password
/// from an unknown email.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
/// Anti-forgery rejection. Never distinguishes expiry from tampering.
pub const MSG_SECURITY_VERIFICATION: &str =
    "Security verification failed. Please refresh the page and try again";
/// Throttling message. Counter state beyond the optional
/// remaining-attempts hint is never exposed.
pub const MSG_TOO_MANY_ATTEMPTS: &str = "Too many attempts. Please try again later";
/// Fixed permission-denied text for ownership and sign-in failures.
pub const MSG_PERMISSION_DENIED: &str = "You do not have permission to perform this action";
/// Generic infrastructure failure. Provider error strings are logged,
/// never surfaced.
pub const MSG_TRY_AGAIN: &str = "Something went wrong. Please try again";
/// Duplicate vote rejection.
pub const MSG_ALREADY_VOTED: &str = "You have already voted on this poll";

/// Per-request data the hosting application extracts from the incoming
/// request and hands to every flow call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Stable browsing-context identifier (session cookie or
    /// anonymous visitor id); scopes anti-forgery tokens and anonymous
    /// rate limits.
    pub context_id: String,
    /// Client IP, when known.
    pub ip_address: Option<String>,
    /// Client User-Agent, when known.
    pub user_agent: Option<String>,
}

/// Boolean outcome of a mutating flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    /// Whether the operation took effect.
    pub success: bool,
    /// User-safe error text, `None` on success.
    pub error: Option<String>,
}

impl FlowOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Composes the security components into the calls the form boundary
/// exposes. One instance per application, shared across requests.
pub struct AuthFlows {
    provider: Arc<dyn IdentityProvider>,
    polls: Arc<dyn PollStore>,
    limiter: Arc<RateLimiter>,
    throttle: LoginThrottle,
    csrf: CsrfGuard,
    authorizer: PollAuthorizer,
    logger: Arc<SecurityLogger>,
    policy: PasswordPolicy,
}

impl std::fmt::Debug for AuthFlows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlows").finish_non_exhaustive()
    }
}

impl AuthFlows {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        polls: Arc<dyn PollStore>,
        limiter: Arc<RateLimiter>,
        throttle: LoginThrottle,
        csrf: CsrfGuard,
        authorizer: PollAuthorizer,
        logger: Arc<SecurityLogger>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            provider,
            polls,
            limiter,
            throttle,
            csrf,
            authorizer,
            logger,
            policy,
        }
    }

    /// The anti-forgery guard, for issuing tokens at render time.
    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    /// Starts an event draft carrying the request origin.
    fn draft(&self, kind: SecurityEventKind, success: bool, ctx: &RequestContext) -> EventDraft {
        EventDraft::new(kind, success).origin(ctx.ip_address.as_deref(), ctx.user_agent.as_deref())
    }

    /// The authenticated user for this request, if any. Provider
    /// failures read as anonymous rather than failing the flow.
    async fn current_user(&self) -> Option<ProviderUser> {
        match self.provider.get_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed, treating as anonymous");
                None
            }
        }
    }
}

/// Normalizes an email for throttle keys, provider calls, and audit
/// records.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parses a form-submitted UUID field.
fn parse_uuid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
