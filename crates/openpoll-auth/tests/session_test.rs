//! Integration tests for the session lifecycle monitor, driven by
//! paused tokio time.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use helpers::{FakeIdentityProvider, RecordingNotifier};
use openpoll_auth::{SessionMonitor, SessionPhase};
use openpoll_core::config::session::SessionConfig;
use openpoll_core::traits::IdentityProvider;

fn monitor_with(
    session_ttl: i64,
    refresh_failures: u32,
) -> (SessionMonitor, Arc<FakeIdentityProvider>, Arc<RecordingNotifier>) {
    let provider = Arc::new(FakeIdentityProvider::new());
    provider.set_session_ttl(session_ttl);
    provider
        .refresh_failures
        .store(refresh_failures, Ordering::SeqCst);
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = SessionMonitor::new(
        provider.clone(),
        notifier.clone(),
        SessionConfig::default(),
    );
    (monitor, provider, notifier)
}

/// Lets spawned tasks run after a manual clock advance.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_without_session_stays_uninitialized() {
    let (monitor, _, notifier) = monitor_with(3_600, 0);
    monitor.start().await.unwrap();
    assert_eq!(monitor.phase(), SessionPhase::Uninitialized);
    assert!(notifier.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_adopted_session_is_active() {
    let (monitor, provider, _) = monitor_with(3_600, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();

    monitor.start().await.unwrap();
    assert_eq!(monitor.phase(), SessionPhase::Active);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_warning_then_expiry_when_provider_is_unreachable() {
    // 600s session, warning threshold 300s: warning at t=300, refresh
    // retries exhaust without reaching the provider, hard expiry at
    // t=600 signs the user out.
    let (monitor, provider, notifier) = monitor_with(600, u32::MAX);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    let mut rx = monitor.subscribe();
    rx.wait_for(|p| *p == SessionPhase::NearExpiry).await.unwrap();

    let events = notifier.events();
    assert!(
        events.iter().any(|e| e.starts_with("expiring:")),
        "expected an expiry warning, got {events:?}"
    );

    rx.wait_for(|p| *p == SessionPhase::Expired).await.unwrap();
    settle().await;

    let events = notifier.events();
    let connectivity = events.iter().position(|e| e == "connectivity");
    let expired = events.iter().position(|e| e == "expired");
    assert!(expired.is_some(), "expected expiry, got {events:?}");
    assert!(
        connectivity.unwrap() < expired.unwrap(),
        "connectivity warning should precede expiry: {events:?}"
    );
    assert!(!provider.has_session(), "expiry should sign out");
}

#[tokio::test(start_paused = true)]
async fn test_short_session_warns_immediately() {
    // 120s to expiry is already inside the 300s threshold.
    let (monitor, provider, notifier) = monitor_with(120, u32::MAX);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    let mut rx = monitor.subscribe();
    rx.wait_for(|p| *p == SessionPhase::NearExpiry).await.unwrap();

    let warning = notifier
        .events()
        .into_iter()
        .find(|e| e.starts_with("expiring:"))
        .expect("expected a warning");
    let remaining: u64 = warning
        .strip_prefix("expiring:")
        .unwrap()
        .parse()
        .unwrap();
    assert!(remaining <= 120, "remaining was {remaining}");
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_successful_refresh_keeps_session_active() {
    let (monitor, provider, notifier) = monitor_with(600, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    // Refreshed sessions live long enough that no timer fires again
    // within the observed window.
    provider.set_session_ttl(7_200);
    monitor.start().await.unwrap();

    // Past the original 600s deadline; the refresh at t=300 moved it.
    tokio::time::sleep(Duration::from_secs(900)).await;
    settle().await;

    assert_eq!(monitor.phase(), SessionPhase::Active);
    assert!(notifier.events().is_empty(), "{:?}", notifier.events());
    assert!(provider.refresh_calls.load(Ordering::SeqCst) >= 1);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_before_deadline_warn_without_sign_out() {
    // Long session: the scheduled refresh at t=600 fails through all
    // retries, but the deadline is far away, so the user stays signed
    // in and only sees a connectivity warning.
    let (monitor, provider, notifier) = monitor_with(7_200, 4);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    // t=600 refresh + backoffs (1s, 2s, 4s) for the three retries.
    tokio::time::sleep(Duration::from_secs(640)).await;
    settle().await;

    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 4);
    assert_eq!(notifier.events(), vec!["connectivity".to_string()]);
    assert_eq!(monitor.phase(), SessionPhase::Active);
    assert!(provider.has_session());
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_now_extends_the_deadline() {
    let (monitor, provider, notifier) = monitor_with(600, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    provider.set_session_ttl(7_200);
    monitor.start().await.unwrap();

    monitor.refresh_now().await;
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);

    // Past the original deadline; the manual refresh moved it.
    tokio::time::sleep(Duration::from_secs(250)).await;
    settle().await;
    assert_eq!(monitor.phase(), SessionPhase::Active);
    assert!(notifier.events().is_empty());
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_brief_background_does_not_resync() {
    let (monitor, provider, _) = monitor_with(7_200, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    monitor.handle_visibility_change(false);
    tokio::time::advance(Duration::from_secs(10)).await;
    monitor.handle_visibility_change(true);
    settle().await;

    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_prolonged_background_triggers_resync() {
    let (monitor, provider, _) = monitor_with(7_200, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    monitor.handle_visibility_change(false);
    // The scheduled refresh at t=600 also fires during this span.
    tokio::time::advance(Duration::from_secs(650)).await;
    settle().await;
    let scheduled = provider.refresh_calls.load(Ordering::SeqCst);

    monitor.handle_visibility_change(true);
    settle().await;

    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), scheduled + 1);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_resync_keeps_refresh_timer_live() {
    let (monitor, provider, _) = monitor_with(7_200, 0);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    monitor.handle_visibility_change(false);
    tokio::time::advance(Duration::from_secs(650)).await;
    settle().await;
    monitor.handle_visibility_change(true);
    settle().await;
    let after_resync = provider.refresh_calls.load(Ordering::SeqCst);

    // The resync reschedules the regular timers; the next interval
    // refresh must still fire instead of dying with the resync task.
    tokio::time::advance(Duration::from_secs(650)).await;
    settle().await;

    assert!(provider.refresh_calls.load(Ordering::SeqCst) > after_resync);
    assert_eq!(monitor.phase(), SessionPhase::Active);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_all_timers() {
    let (monitor, provider, notifier) = monitor_with(600, u32::MAX);
    provider.add_account("a@b.c", "pw");
    provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();

    monitor.stop();
    tokio::time::advance(Duration::from_secs(700)).await;
    settle().await;

    assert!(notifier.events().is_empty());
    assert!(provider.has_session());
}

#[tokio::test(start_paused = true)]
async fn test_adopting_a_new_session_cancels_stale_timers() {
    let (monitor, provider, notifier) = monitor_with(600, u32::MAX);
    provider.add_account("a@b.c", "pw");
    let session = provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.start().await.unwrap();
    drop(session);

    // A fresh sign-in hands the monitor a longer session before the
    // old warning would have fired.
    provider.set_session_ttl(7_200);
    let renewed = provider.sign_in_with_password("a@b.c", "pw").await.unwrap();
    monitor.adopt(&renewed);

    tokio::time::advance(Duration::from_secs(400)).await;
    settle().await;

    assert_eq!(monitor.phase(), SessionPhase::Active);
    assert!(
        notifier.events().iter().all(|e| !e.starts_with("expiring:")),
        "stale warning fired: {:?}",
        notifier.events()
    );
    monitor.stop();
}
