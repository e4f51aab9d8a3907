//! In-memory, process-local rate limiting.
//!
//! State is not shared across instances: a multi-process deployment gets
//! independent limits per instance. Accepted limitation for this scope; a
//! shared store can be plugged in through [`RateLimitStore`].

mod limit;
mod limiter;
mod store;

pub use limit::Limit;
pub use limiter::{RateLimitResult, RateLimiter};
pub use store::{HitResult, InMemoryStore, RateLimitInfo, RateLimitStore};
