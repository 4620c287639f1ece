//! # openpoll-auth
//!
//! The security core of OpenPoll: everything that stands between a form
//! submission and the hosted identity/storage providers.
//!
//! ## Modules
//!
//! - `rate_limit` — per-action sliding-window attempt counting
//! - `csrf` — anti-forgery token issuance, validation, and rotation
//! - `audit` — structured security event logging with risk scoring
//! - `authz` — ownership and public-view authorization checks
//! - `password` — password policy enforcement
//! - `session` — client-resident session lifecycle monitoring
//! - `flows` — the auth/vote/poll orchestrator composing all of the above

pub mod audit;
pub mod authz;
pub mod csrf;
pub mod flows;
pub mod password;
pub mod rate_limit;
pub mod session;

pub use audit::{EventDraft, MemoryEventSink, SecurityLogger, SecurityStats};
pub use authz::{PollAction, PollAuthorizer};
pub use csrf::CsrfGuard;
pub use flows::{AuthFlows, FlowOutcome, RequestContext, ResetOutcome, SignInOutcome};
pub use password::PasswordPolicy;
pub use rate_limit::{LoginThrottle, RateDecision, RateLimitAction, RateLimiter};
pub use session::{SessionMonitor, SessionPhase};
