//! Session expiry tracking, proactive refresh, and hard-expiry
//! handling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use openpoll_core::config::session::SessionConfig;
use openpoll_core::result::AppResult;
use openpoll_core::traits::identity::{IdentityProvider, ProviderSession};
use openpoll_core::traits::notify::SessionNotifier;

use super::phase::SessionPhase;

/// Mutable monitor state behind a single lock.
///
/// The lock is only ever held for field access, never across an await.
#[derive(Debug, Default)]
struct MonitorState {
    /// When the adopted session hard-expires.
    deadline: Option<Instant>,
    /// Live pre-expiry warning task, at most one.
    warning_task: Option<JoinHandle<()>>,
    /// Live proactive refresh task, at most one.
    refresh_task: Option<JoinHandle<()>>,
    /// When the page went hidden, if it currently is.
    hidden_at: Option<Instant>,
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn SessionNotifier>,
    config: SessionConfig,
    phase_tx: watch::Sender<SessionPhase>,
    state: Mutex<MonitorState>,
}

/// Watches the provider session from the client side: warns the user
/// ahead of expiry, refreshes proactively, and signs out exactly once
/// when the session truly dies.
///
/// Exactly one warning task and one refresh task are live at any time;
/// rescheduling aborts the previous handles first, so a refreshed
/// session can never receive a stale warning.
#[derive(Clone)]
pub struct SessionMonitor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMonitor")
            .field("phase", &self.phase())
            .finish()
    }
}

impl SessionMonitor {
    /// Creates a monitor; no timers run until a session is adopted.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn SessionNotifier>,
        config: SessionConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                provider,
                notifier,
                config,
                phase_tx,
                state: Mutex::new(MonitorState::default()),
            }),
        }
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        *self.inner.phase_tx.borrow()
    }

    /// Subscribes to phase changes. Each change is published once.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Fetches the current session from the provider and begins
    /// monitoring it. With no session the monitor stays uninitialized.
    pub async fn start(&self) -> AppResult<()> {
        match self.inner.provider.get_session().await? {
            Some(session) => {
                info!(expires_at = %session.expires_at, "Adopted existing session");
                self.adopt(&session);
            }
            None => {
                debug!("No session to monitor");
            }
        }
        Ok(())
    }

    /// Adopts a session (fresh sign-in or provider fetch) and
    /// (re)schedules the warning and refresh timers around its expiry.
    pub fn adopt(&self, session: &ProviderSession) {
        let deadline = deadline_from(session.expires_at);
        {
            let mut state = self.inner.lock_state();
            state.deadline = Some(deadline);
        }
        self.inner.set_phase(SessionPhase::Active);
        Inner::schedule(&self.inner, deadline);
    }

    /// Forces an immediate refresh attempt, outside the regular
    /// schedule.
    pub async fn refresh_now(&self) {
        {
            let mut state = self.inner.lock_state();
            if state.deadline.is_none() {
                return;
            }
            if let Some(task) = state.refresh_task.take() {
                task.abort();
            }
        }
        Inner::refresh_with_retry(Arc::clone(&self.inner)).await;
    }

    /// Records page visibility transitions. Returning to the
    /// foreground after being hidden at least one refresh interval
    /// triggers an immediate resync, since scheduled refreshes may
    /// have been throttled while hidden.
    pub fn handle_visibility_change(&self, visible: bool) {
        let stale = {
            let mut state = self.inner.lock_state();
            if !visible {
                state.hidden_at = Some(Instant::now());
                return;
            }
            let hidden_for = state.hidden_at.take().map(|at| at.elapsed());
            state.deadline.is_some()
                && hidden_for
                    .is_some_and(|d| d >= Duration::from_secs(self.inner.config.refresh_interval_seconds))
        };

        if stale {
            debug!("Resyncing session after prolonged background");
            // The handle must be installed before the refresh can
            // reschedule itself, or a fast resync gets aborted by its
            // own replacement. Spawning under the lock guarantees the
            // ordering; the task only touches state after the guard
            // drops.
            let mut state = self.inner.lock_state();
            let handle = tokio::spawn(Inner::refresh_with_retry(Arc::clone(&self.inner)));
            if let Some(task) = state.refresh_task.replace(handle) {
                task.abort();
            }
        }
    }

    /// Stops monitoring and cancels all timers. The phase is left
    /// as-is; no further notifications fire.
    pub fn stop(&self) {
        let mut state = self.inner.lock_state();
        state.deadline = None;
        state.hidden_at = None;
        if let Some(task) = state.warning_task.take() {
            task.abort();
        }
        if let Some(task) = state.refresh_task.take() {
            task.abort();
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a phase if it differs from the current one. Returns
    /// whether a change was announced.
    fn set_phase(&self, phase: SessionPhase) -> bool {
        self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        })
    }

    /// Replaces both timers around the given deadline.
    fn schedule(inner: &Arc<Inner>, deadline: Instant) {
        let tte = deadline.saturating_duration_since(Instant::now());
        let threshold = Duration::from_secs(inner.config.warning_threshold_seconds);
        let refresh_interval = Duration::from_secs(inner.config.refresh_interval_seconds);

        // Inside the threshold the warning fires immediately; the
        // refresh is pulled forward with it.
        let warning_delay = tte.saturating_sub(threshold);
        let refresh_delay = refresh_interval.min(warning_delay);

        // Spawned under the lock: both handles are installed before
        // either task can reach its own reschedule, which matters when
        // a delay saturates to zero.
        let mut state = inner.lock_state();
        let warning = tokio::spawn(Self::run_warning(
            Arc::clone(inner),
            warning_delay,
            deadline,
        ));
        let refresh = tokio::spawn(Self::run_refresh(Arc::clone(inner), refresh_delay));

        if let Some(task) = state.warning_task.replace(warning) {
            task.abort();
        }
        if let Some(task) = state.refresh_task.replace(refresh) {
            task.abort();
        }
    }

    /// Warns ahead of expiry, then forces expiry if nothing refreshed
    /// the session in the meantime. A successful refresh reschedules
    /// and aborts this task.
    async fn run_warning(inner: Arc<Inner>, delay: Duration, deadline: Instant) {
        tokio::time::sleep(delay).await;

        let remaining = deadline.saturating_duration_since(Instant::now());
        inner.notifier.session_expiring(remaining);
        inner.set_phase(SessionPhase::NearExpiry);

        tokio::time::sleep_until(deadline).await;
        Self::expire(&inner);
    }

    async fn run_refresh(inner: Arc<Inner>, delay: Duration) {
        tokio::time::sleep(delay).await;
        Self::refresh_with_retry(inner).await;
    }

    /// Attempts a refresh, backing off exponentially on failure.
    ///
    /// Exhausted retries do not sign the user out unless the deadline
    /// has already passed: an unreachable provider is a connectivity
    /// problem, not proof the session is invalid.
    async fn refresh_with_retry(inner: Arc<Inner>) {
        let mut retry = 0u32;
        loop {
            match inner.provider.refresh_session().await {
                Ok(session) => {
                    debug!(expires_at = %session.expires_at, "Session refreshed");
                    let deadline = deadline_from(session.expires_at);
                    {
                        let mut state = inner.lock_state();
                        state.deadline = Some(deadline);
                    }
                    inner.set_phase(SessionPhase::Active);
                    // Reschedule aborts this task's own handle; nothing
                    // may await after this point.
                    Self::schedule(&inner, deadline);
                    return;
                }
                Err(e) => {
                    warn!(retry, error = %e, "Session refresh failed");
                    if retry >= inner.config.max_refresh_retries {
                        let past_deadline = inner
                            .lock_state()
                            .deadline
                            .is_some_and(|d| Instant::now() >= d);
                        if past_deadline {
                            Self::expire(&inner);
                        } else {
                            inner.notifier.connectivity_degraded();
                        }
                        return;
                    }
                    let backoff = Duration::from_millis(inner.config.backoff_ms(retry));
                    tokio::time::sleep(backoff).await;
                    retry += 1;
                }
            }
        }
    }

    /// Hard expiry: notify, sign out at the provider, cancel timers.
    ///
    /// The notification and phase change happen synchronously before
    /// any handle is aborted, because the caller may be one of the
    /// timer tasks aborting itself.
    fn expire(inner: &Arc<Inner>) {
        if !inner.set_phase(SessionPhase::Expired) {
            return;
        }
        info!("Session expired, signing out");
        inner.notifier.session_expired();

        let provider = Arc::clone(&inner.provider);
        tokio::spawn(async move {
            if let Err(e) = provider.sign_out().await {
                warn!(error = %e, "Sign-out after expiry failed");
            }
        });

        let mut state = inner.lock_state();
        state.deadline = None;
        state.hidden_at = None;
        if let Some(task) = state.warning_task.take() {
            task.abort();
        }
        if let Some(task) = state.refresh_task.take() {
            task.abort();
        }
    }
}

fn deadline_from(expires_at: DateTime<Utc>) -> Instant {
    let remaining = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    Instant::now() + remaining
}
