//! Key builders for all OpenPoll store entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the subsystem uses.

/// Prefix applied to all OpenPoll keys.
const PREFIX: &str = "openpoll";

// ── Rate limit keys ────────────────────────────────────────

/// Key for a rate limit counter, scoped by action and limited entity.
pub fn rate_counter(action: &str, identity: &str) -> String {
    format!("{PREFIX}:rate:{action}:{identity}")
}

/// Key for the window-start timestamp of a rate limit counter.
pub fn rate_window(action: &str, identity: &str) -> String {
    format!("{PREFIX}:rate:{action}:{identity}:window")
}

// ── Anti-forgery keys ──────────────────────────────────────

/// Key for the active anti-forgery token of a browsing context.
pub fn csrf_token(context_id: &str) -> String {
    format!("{PREFIX}:csrf:{context_id}")
}
