use chrono::Duration;

use crate::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    Lax,
    #[default]
    Strict,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }
}

/// Cookie attributes and lifetime for the sealed session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    pub session_lifetime: Duration,
    pub secret_key: SecretString,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "rb_session".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Strict,
            session_lifetime: Duration::days(7),
            secret_key: SecretString::new(""),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.secret_key.is_empty() {
            return Err("secret_key must not be empty");
        }
        if self.secret_key.len() < crate::config::MIN_SECRET_LEN {
            return Err("secret_key should be at least 32 bytes");
        }
        Ok(())
    }
}
