//! User-facing notification surface consumed by the session monitor.

use std::time::Duration;

/// Receives session lifecycle notifications.
///
/// Implementations surface these to the user (toast, banner, dialog);
/// the monitor only decides *when* they fire. All callbacks must be
/// non-blocking.
pub trait SessionNotifier: Send + Sync + 'static {
    /// The session will expire in `remaining` unless refreshed.
    fn session_expiring(&self, remaining: Duration);

    /// The session hard-expired and the user has been signed out.
    fn session_expired(&self);

    /// Refresh retries were exhausted without reaching the provider.
    /// The session may still be valid; this is a connectivity warning,
    /// not a sign-out.
    fn connectivity_degraded(&self);
}

/// Notifier that discards everything (headless contexts and tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl SessionNotifier for NoopNotifier {
    fn session_expiring(&self, _remaining: Duration) {}

    fn session_expired(&self) {}

    fn connectivity_degraded(&self) {}
}
