//! In-memory store implementation using the moka and dashmap crates.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use openpoll_core::config::cache::MemoryCacheConfig;
use openpoll_core::result::AppResult;
use openpoll_core::traits::kv::KeyValueStore;

/// A stored value together with its per-entry TTL.
#[derive(Debug, Clone)]
struct ValueEntry {
    value: String,
    ttl: Option<Duration>,
}

/// Per-entry expiry policy reading the TTL off the stored value.
struct ValueExpiry;

impl Expiry<String, ValueEntry> for ValueExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ValueEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// A counter cell with an optional expiry stamp.
///
/// Counters live outside moka so that `incr` is atomic under the
/// dashmap entry lock and the expiry window can be inspected.
#[derive(Debug)]
struct CounterCell {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterCell {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store provider using moka for valued keys and dashmap
/// for atomic counters.
#[derive(Clone)]
pub struct MemoryStore {
    /// Valued entries with per-entry TTL.
    cache: Cache<String, ValueEntry>,
    /// Counters with explicit expiry stamps.
    counters: Arc<dashmap::DashMap<String, CounterCell>>,
    /// Default TTL for entries set without one.
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryStore {
    /// Create a new in-memory store from configuration.
    pub fn new(config: &MemoryCacheConfig, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(ValueExpiry)
            .build();

        Self {
            cache,
            counters: Arc::new(dashmap::DashMap::new()),
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    /// Read a counter value, honoring its expiry stamp.
    fn counter_value(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        let cell = self.counters.get(key)?;
        if cell.is_expired(now) {
            return None;
        }
        Some(cell.value)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(entry) = self.cache.get(key).await {
            return Ok(Some(entry.value));
        }
        // Counters are readable through get() for parity with Redis,
        // where INCR produces an ordinary key.
        Ok(self.counter_value(key).map(|v| v.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                ValueEntry {
                    value: value.to_string(),
                    ttl: Some(ttl),
                },
            )
            .await;
        Ok(())
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.set(key, value, self.default_ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        if self.cache.contains_key(key) {
            return Ok(true);
        }
        Ok(self.counter_value(key).is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        // moka has no native set-if-not-exists; get-then-insert is
        // acceptable for single-node in-memory use.
        if self.cache.contains_key(key) {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        Ok(true)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let now = Instant::now();
        let mut cell = self.counters.entry(key.to_string()).or_insert(CounterCell {
            value: 0,
            expires_at: None,
        });

        if cell.is_expired(now) {
            // Window elapsed: the counter restarts from scratch.
            cell.value = 0;
            cell.expires_at = None;
        }

        cell.value += 1;
        Ok(cell.value)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let now = Instant::now();
        let mut cell = self.counters.entry(key.to_string()).or_insert(CounterCell {
            value: 0,
            expires_at: None,
        });

        if cell.is_expired(now) {
            cell.value = 0;
            cell.expires_at = None;
        }

        // Matches Redis EXPIRE NX: only an unarmed window picks up the
        // TTL, so later increments cannot stretch it.
        if cell.expires_at.is_none() {
            cell.expires_at = Some(now + ttl);
        }

        cell.value += 1;
        Ok(cell.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();

        if let Some(mut cell) = self.counters.get_mut(key) {
            if !cell.is_expired(now) {
                cell.expires_at = Some(now + ttl);
                return Ok(true);
            }
        }

        // Re-insert valued entries with the new TTL.
        if let Some(entry) = self.cache.get(key).await {
            self.cache
                .insert(
                    key.to_string(),
                    ValueEntry {
                        value: entry.value,
                        ttl: Some(ttl),
                    },
                )
                .await;
            return Ok(true);
        }

        debug!(key, "expire on missing key");
        Ok(false)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
