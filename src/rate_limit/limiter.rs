use std::collections::HashMap;
use std::sync::Arc;

use super::limit::Limit;
use super::store::RateLimitStore;
use crate::AppError;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed. Contains remaining attempts.
    Allowed {
        remaining: u32,
        reset_at: chrono::DateTime<chrono::Utc>,
    },
    /// Request is rate limited.
    Limited { retry_after: i64, message: String },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }

    pub fn retry_after(&self) -> Option<i64> {
        match self {
            Self::Limited { retry_after, .. } => Some(*retry_after),
            Self::Allowed { .. } => None,
        }
    }
}

/// Rate limiter with named limit configurations.
///
/// # Example
///
/// ```rust
/// use reviewbase::rate_limit::{InMemoryStore, Limit, RateLimiter};
/// use std::sync::Arc;
///
/// let store = Arc::new(InMemoryStore::new());
/// let limiter = RateLimiter::new(store)
///     .for_("login", Limit::per_minute(5))
///     .for_("reply", Limit::per_minute(15));
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limits: HashMap<String, Limit>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            limits: HashMap::new(),
        }
    }

    /// Registers a named rate limit.
    #[must_use]
    pub fn for_(mut self, name: impl Into<String>, limit: Limit) -> Self {
        self.limits.insert(name.into(), limit);
        self
    }

    pub fn get_limit(&self, name: &str) -> Option<&Limit> {
        self.limits.get(name)
    }

    /// Records a hit against a named limit and reports whether the request
    /// should proceed. `key` scopes the counter (e.g. a client IP for
    /// `login`, a user id for `reply`).
    pub async fn check(&self, limit_name: &str, key: &str) -> Result<RateLimitResult, AppError> {
        let limit = self.limits.get(limit_name).ok_or_else(|| {
            AppError::Config(format!("Rate limit '{limit_name}' not configured"))
        })?;

        let full_key = format!("{limit_name}:{key}");
        let hit = self
            .store
            .hit(&full_key, limit.max_attempts(), limit.window_secs())
            .await?;

        if hit.allowed {
            Ok(RateLimitResult::Allowed {
                remaining: limit.max_attempts().saturating_sub(hit.attempts),
                reset_at: hit.reset_at,
            })
        } else {
            let message = limit
                .get_message()
                .unwrap_or("Too many requests. Please try again later.")
                .to_owned();

            Ok(RateLimitResult::Limited {
                retry_after: (hit.reset_at - chrono::Utc::now()).num_seconds().max(0),
                message,
            })
        }
    }

    /// Clears the counter for a key.
    pub async fn clear(&self, limit_name: &str, key: &str) -> Result<(), AppError> {
        let full_key = format!("{limit_name}:{key}");
        self.store.reset(&full_key).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limits", &self.limits.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
