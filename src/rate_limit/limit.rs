use chrono::Duration;

/// A named rate limit: at most `max_attempts` allowed hits per window.
///
/// The boundary is inclusive: exactly `max_attempts` hits are allowed, the
/// next one is denied.
#[derive(Debug, Clone)]
pub struct Limit {
    pub(crate) max_attempts: u32,
    pub(crate) window: Duration,
    pub(crate) message: Option<String>,
}

impl Limit {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            message: None,
        }
    }

    #[must_use]
    pub fn per_minute(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::minutes(1))
    }

    #[must_use]
    pub fn per_hour(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::hours(1))
    }

    #[must_use]
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn get_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
