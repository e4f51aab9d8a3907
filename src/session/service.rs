//! Session service: reads and writes the sealed session cookie.
//!
//! Owns a [`SessionConfig`] and wraps the codec in `seal`. Handlers and the
//! gatekeeper receive this by injection; nothing reads the secret from
//! ambient process state.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use super::config::SessionConfig;
use super::{seal, SessionUser};
use crate::AppError;

#[derive(Debug, Clone)]
pub struct SessionService {
    config: SessionConfig,
}

impl SessionService {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Decodes the session from request headers.
    ///
    /// Absent cookie, tampered seal and expired seal all read as `None`.
    #[must_use]
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let sealed = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|header| cookie_value(header, &self.config.cookie_name))?;

        seal::unseal(sealed, &self.config.secret_key)
    }

    /// Produces the `Set-Cookie` value that logs `user` in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the configured secret is unusable.
    pub fn login_cookie(&self, user: &SessionUser) -> Result<String, AppError> {
        let sealed = seal::seal(user, &self.config.secret_key, self.config.session_lifetime)?;
        Ok(self.cookie_string(&sealed, self.config.session_lifetime.num_seconds()))
    }

    /// Produces the `Set-Cookie` value that clears the session.
    ///
    /// Idempotent: issuing it without an existing session is a no-op for the
    /// client.
    #[must_use]
    pub fn logout_cookie(&self) -> String {
        self.cookie_string("", 0)
    }

    fn cookie_string(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; SameSite={}",
            self.config.cookie_name,
            value,
            self.config.cookie_path,
            max_age,
            self.config.cookie_same_site.as_str(),
        );
        if self.config.cookie_http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.config.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Extracts a cookie value from a `Cookie` header.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}
