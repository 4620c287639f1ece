//! Session lifecycle phases.

/// Where the monitored session is in its lifecycle.
///
/// Published through a `tokio::sync::watch` channel so every consumer
/// observes the same single source of truth; a phase is never announced
/// twice in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session adopted yet, or monitoring stopped.
    #[default]
    Uninitialized,
    /// A live session with comfortable time remaining.
    Active,
    /// Expiry is inside the warning threshold; the user has been told.
    NearExpiry,
    /// The session hard-expired and the user was signed out.
    Expired,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Active => write!(f, "active"),
            Self::NearExpiry => write!(f, "near_expiry"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
