use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::AppError;

/// How often the in-memory store sweeps out expired entries at most.
const SWEEP_INTERVAL: Duration = Duration::minutes(5);

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub attempts: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    pub fn available_in(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

/// Outcome of recording one attempt against a key.
#[derive(Debug, Clone)]
pub struct HitResult {
    pub allowed: bool,
    pub attempts: u32,
    pub reset_at: DateTime<Utc>,
}

/// implement this trait for custom storage (redis, postgres, etc.)
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records an attempt. On the first hit for a key, or once the window
    /// has passed, the count restarts at 1. A denied hit does not increment
    /// the counter, so a burst of rejected calls cannot extend the lockout.
    async fn hit(
        &self,
        key: &str,
        max_attempts: u32,
        window_secs: i64,
    ) -> Result<HitResult, AppError>;

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, AppError>;

    async fn reset(&self, key: &str) -> Result<(), AppError>;
}

struct Inner {
    entries: HashMap<String, RateLimitInfo>,
    last_sweep: DateTime<Utc>,
}

/// Process-local store. Entries for expired windows are removed by an
/// opportunistic sweep that runs at most once per [`SWEEP_INTERVAL`],
/// independent of any particular key's window, so churn of short-lived keys
/// (per-IP, per-user) cannot grow memory unbounded.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    sweep_interval: Duration,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_sweep_interval(SWEEP_INTERVAL)
    }

    #[must_use]
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                last_sweep: Utc::now(),
            }),
            sweep_interval,
        }
    }

    /// Number of live entries. Test and introspection hook.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn hit(
        &self,
        key: &str,
        max_attempts: u32,
        window_secs: i64,
    ) -> Result<HitResult, AppError> {
        let now = Utc::now();
        let window = Duration::seconds(window_secs);

        let mut inner = self
            .inner
            .write()
            .map_err(|_| AppError::Dependency("rate limit lock poisoned".to_owned()))?;

        if now - inner.last_sweep >= self.sweep_interval {
            inner.last_sweep = now;
            inner.entries.retain(|_, info| info.reset_at > now);
        }

        let entry = inner.entries.entry(key.to_owned());
        let info = match entry {
            std::collections::hash_map::Entry::Occupied(mut occupied) => {
                let info = occupied.get_mut();
                if info.reset_at <= now {
                    // Window expired, start a new one
                    info.attempts = 1;
                    info.reset_at = now + window;
                } else if info.attempts >= max_attempts {
                    return Ok(HitResult {
                        allowed: false,
                        attempts: info.attempts,
                        reset_at: info.reset_at,
                    });
                } else {
                    info.attempts += 1;
                }
                info.clone()
            }
            std::collections::hash_map::Entry::Vacant(vacant) => vacant
                .insert(RateLimitInfo {
                    attempts: 1,
                    reset_at: now + window,
                })
                .clone(),
        };

        Ok(HitResult {
            allowed: true,
            attempts: info.attempts,
            reset_at: info.reset_at,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, AppError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| AppError::Dependency("rate limit lock poisoned".to_owned()))?;

        Ok(inner.entries.get(key).cloned())
    }

    async fn reset(&self, key: &str) -> Result<(), AppError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| AppError::Dependency("rate limit lock poisoned".to_owned()))?;

        inner.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_max_then_denies() {
        let store = InMemoryStore::new();

        for i in 1..=5 {
            let hit = store.hit("k", 5, 60).await.unwrap();
            assert!(hit.allowed, "hit {i} should be allowed");
            assert_eq!(hit.attempts, i);
        }

        let hit = store.hit("k", 5, 60).await.unwrap();
        assert!(!hit.allowed);
        // Denied hits must not consume attempts
        assert_eq!(hit.attempts, 5);
    }

    #[tokio::test]
    async fn test_denied_hit_does_not_extend_window() {
        let store = InMemoryStore::new();

        store.hit("k", 1, 60).await.unwrap();
        let first_reset = store.get("k").await.unwrap().unwrap().reset_at;

        store.hit("k", 1, 60).await.unwrap();
        store.hit("k", 1, 60).await.unwrap();

        let later_reset = store.get("k").await.unwrap().unwrap().reset_at;
        assert_eq!(first_reset, later_reset);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let store = InMemoryStore::new();

        store.hit("k", 2, 0).await.unwrap();
        store.hit("k", 2, 0).await.unwrap();

        // Zero-second window: already expired, every hit restarts at 1
        let hit = store.hit("k", 2, 0).await.unwrap();
        assert!(hit.allowed);
        assert_eq!(hit.attempts, 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemoryStore::new();

        store.hit("key-a", 1, 60).await.unwrap();
        assert!(!store.hit("key-a", 1, 60).await.unwrap().allowed);

        assert!(store.hit("key-b", 1, 60).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_reset_clears_key() {
        let store = InMemoryStore::new();

        store.hit("k", 1, 60).await.unwrap();
        assert!(!store.hit("k", 1, 60).await.unwrap().allowed);

        store.reset("k").await.unwrap();
        assert!(store.hit("k", 1, 60).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let store = InMemoryStore::with_sweep_interval(Duration::zero());

        store.hit("expired", 5, 0).await.unwrap();
        assert_eq!(store.len(), 1);

        // Any later hit triggers the sweep and drops the dead entry
        store.hit("live", 5, 60).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("expired").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_respects_interval() {
        let store = InMemoryStore::with_sweep_interval(Duration::minutes(5));

        store.hit("expired", 5, 0).await.unwrap();
        store.hit("live", 5, 60).await.unwrap();

        // Interval has not elapsed since construction; nothing swept yet
        assert_eq!(store.len(), 2);
    }
}
