//! Shared test helpers: in-memory fakes behind the provider seams.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use openpoll_auth::audit::MemoryEventSink;
use openpoll_auth::authz::PollAuthorizer;
use openpoll_auth::flows::RequestContext;
use openpoll_auth::{
    AuthFlows, CsrfGuard, LoginThrottle, PasswordPolicy, RateLimiter, SecurityLogger,
};
use openpoll_cache::CacheManager;
use openpoll_cache::memory::MemoryStore;
use openpoll_core::config::AppConfig;
use openpoll_core::error::AppError;
use openpoll_core::result::AppResult;
use openpoll_core::traits::audit::NoopEscalation;
use openpoll_core::traits::identity::{IdentityProvider, ProviderSession, ProviderUser};
use openpoll_core::traits::notify::SessionNotifier;
use openpoll_core::traits::polls::{NewPoll, PollStore};

/// Identity provider fake with scriptable failures.
#[derive(Debug, Default)]
pub struct FakeIdentityProvider {
    /// email -> (user id, password)
    accounts: Mutex<HashMap<String, (Uuid, String)>>,
    session: Mutex<Option<ProviderSession>>,
    /// reset token -> email
    reset_tokens: Mutex<HashMap<String, String>>,
    /// Upcoming refresh calls that should fail.
    pub refresh_failures: AtomicU32,
    /// Total refresh calls observed.
    pub refresh_calls: AtomicU32,
    /// Whether reset email dispatch should fail.
    pub reset_unavailable: Mutex<bool>,
    /// Lifetime of minted sessions in seconds.
    pub session_ttl_seconds: Mutex<i64>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        let provider = Self::default();
        *provider.session_ttl_seconds.lock().unwrap() = 3_600;
        provider
    }

    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_lowercase(), (id, password.to_string()));
        id
    }

    pub fn add_reset_token(&self, token: &str, email: &str) {
        self.reset_tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), email.to_lowercase());
    }

    pub fn set_session_ttl(&self, seconds: i64) {
        *self.session_ttl_seconds.lock().unwrap() = seconds;
    }

    pub fn has_session(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    fn mint_session(&self, id: Uuid, email: &str) -> ProviderSession {
        let ttl = *self.session_ttl_seconds.lock().unwrap();
        let session = ProviderSession {
            access_token: Uuid::new_v4().to_string(),
            user: ProviderUser {
                id,
                email: email.to_string(),
            },
            expires_at: Utc::now() + Duration::seconds(ttl),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        session
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<ProviderSession> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((id, stored)) if stored == password => Ok(self.mint_session(id, email)),
            _ => Err(AppError::authentication("Invalid credentials")),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _metadata: serde_json::Value,
    ) -> AppResult<ProviderUser> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AppError::conflict("Email already registered"));
        }
        let id = Uuid::new_v4();
        accounts.insert(email.to_string(), (id, password.to_string()));
        Ok(ProviderUser {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    async fn get_session(&self) -> AppResult<Option<ProviderSession>> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn get_user(&self) -> AppResult<Option<ProviderUser>> {
        Ok(self.session.lock().unwrap().as_ref().map(|s| s.user.clone()))
    }

    async fn refresh_session(&self) -> AppResult<ProviderSession> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .refresh_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(AppError::external("Provider unreachable"));
        }
        let current = self.session.lock().unwrap().clone();
        match current {
            Some(session) => Ok(self.mint_session(session.user.id, &session.user.email)),
            None => Err(AppError::session("No session to refresh")),
        }
    }

    async fn reset_password_for_email(&self, _email: &str) -> AppResult<()> {
        if *self.reset_unavailable.lock().unwrap() {
            return Err(AppError::external("Email service down"));
        }
        Ok(())
    }

    async fn verify_reset_token(&self, token: &str) -> AppResult<ProviderUser> {
        let email = self.reset_tokens.lock().unwrap().remove(token);
        let email = email.ok_or_else(|| AppError::authentication("Invalid reset token"))?;
        let account = self.accounts.lock().unwrap().get(&email).cloned();
        match account {
            Some((id, _)) => Ok(ProviderUser { id, email }),
            None => Err(AppError::authentication("Invalid reset token")),
        }
    }

    async fn update_password(&self, new_password: &str) -> AppResult<()> {
        let email = self
            .session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.user.email.clone());
        if let Some(email) = email {
            if let Some(entry) = self.accounts.lock().unwrap().get_mut(&email) {
                entry.1 = new_password.to_string();
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PollRecord {
    owner_id: Uuid,
    question: String,
    options: Vec<Uuid>,
}

/// Poll store fake.
#[derive(Debug, Default)]
pub struct MemoryPollStore {
    polls: Mutex<HashMap<Uuid, PollRecord>>,
    votes: Mutex<Vec<(Uuid, Uuid, Option<Uuid>)>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_poll(&self, owner_id: Uuid, option_count: usize) -> (Uuid, Vec<Uuid>) {
        let poll_id = Uuid::new_v4();
        let options: Vec<Uuid> = (0..option_count).map(|_| Uuid::new_v4()).collect();
        self.polls.lock().unwrap().insert(
            poll_id,
            PollRecord {
                owner_id,
                question: "Favorite color?".to_string(),
                options: options.clone(),
            },
        );
        (poll_id, options)
    }

    pub fn vote_count(&self, poll_id: Uuid) -> usize {
        self.votes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| *p == poll_id)
            .count()
    }

    pub fn question(&self, poll_id: Uuid) -> Option<String> {
        self.polls
            .lock()
            .unwrap()
            .get(&poll_id)
            .map(|p| p.question.clone())
    }

    pub fn poll_exists(&self, poll_id: Uuid) -> bool {
        self.polls.lock().unwrap().contains_key(&poll_id)
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn poll_owner(&self, poll_id: Uuid) -> AppResult<Option<Uuid>> {
        Ok(self.polls.lock().unwrap().get(&poll_id).map(|p| p.owner_id))
    }

    async fn poll_options(&self, poll_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .polls
            .lock()
            .unwrap()
            .get(&poll_id)
            .map(|p| p.options.clone())
            .unwrap_or_default())
    }

    async fn has_vote(&self, poll_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .iter()
            .any(|(p, _, u)| *p == poll_id && *u == Some(user_id)))
    }

    async fn insert_vote(
        &self,
        poll_id: Uuid,
        option_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<()> {
        self.votes.lock().unwrap().push((poll_id, option_id, user_id));
        Ok(())
    }

    async fn create_poll(&self, poll: &NewPoll) -> AppResult<Uuid> {
        let poll_id = Uuid::new_v4();
        let options: Vec<Uuid> = poll.options.iter().map(|_| Uuid::new_v4()).collect();
        self.polls.lock().unwrap().insert(
            poll_id,
            PollRecord {
                owner_id: poll.owner_id,
                question: poll.question.clone(),
                options,
            },
        );
        Ok(poll_id)
    }

    async fn update_poll(&self, poll_id: Uuid, question: &str) -> AppResult<()> {
        match self.polls.lock().unwrap().get_mut(&poll_id) {
            Some(record) => {
                record.question = question.to_string();
                Ok(())
            }
            None => Err(AppError::not_found("Poll not found")),
        }
    }

    async fn delete_poll(&self, poll_id: Uuid) -> AppResult<()> {
        self.polls.lock().unwrap().remove(&poll_id);
        self.votes.lock().unwrap().retain(|(p, _, _)| *p != poll_id);
        Ok(())
    }
}

/// Notifier fake that records every callback.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionNotifier for RecordingNotifier {
    fn session_expiring(&self, remaining: std::time::Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("expiring:{}", remaining.as_secs()));
    }

    fn session_expired(&self) {
        self.events.lock().unwrap().push("expired".to_string());
    }

    fn connectivity_degraded(&self) {
        self.events.lock().unwrap().push("connectivity".to_string());
    }
}

/// Fully wired flow orchestrator over in-memory fakes.
pub struct TestHarness {
    pub flows: AuthFlows,
    pub provider: Arc<FakeIdentityProvider>,
    pub polls: Arc<MemoryPollStore>,
    pub sink: Arc<MemoryEventSink>,
    pub ctx: RequestContext,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = CacheManager::from_store(Arc::new(MemoryStore::new(
            &config.cache.memory,
            config.cache.default_ttl_seconds,
        )));
        let sink = Arc::new(MemoryEventSink::new());
        let logger = Arc::new(SecurityLogger::new(
            sink.clone(),
            config.security.clone(),
            Arc::new(NoopEscalation),
        ));
        let provider = Arc::new(FakeIdentityProvider::new());
        let polls = Arc::new(MemoryPollStore::new());

        let limiter = Arc::new(RateLimiter::new(
            store.clone(),
            config.rate_limit.clone(),
            logger.clone(),
        ));
        let throttle = LoginThrottle::new(
            limiter.clone(),
            config.rate_limit.login_lockout.max_attempts,
        );
        let csrf = CsrfGuard::new(store.clone(), logger.clone(), &config.auth);
        let authorizer = PollAuthorizer::new(polls.clone(), logger.clone(), &config.auth);
        let policy = PasswordPolicy::new(&config.auth);

        let flows = AuthFlows::new(
            provider.clone(),
            polls.clone(),
            limiter,
            throttle,
            csrf,
            authorizer,
            logger,
            policy,
        );

        Self {
            flows,
            provider,
            polls,
            sink,
            ctx: RequestContext {
                context_id: "ctx-test".to_string(),
                ip_address: Some("203.0.113.7".to_string()),
                user_agent: Some("Mozilla/5.0".to_string()),
            },
        }
    }

    /// Issues an anti-forgery token for the harness context.
    pub async fn csrf_token(&self) -> String {
        self.flows
            .csrf()
            .issue(&self.ctx.context_id)
            .await
            .expect("Failed to issue token")
    }
}
