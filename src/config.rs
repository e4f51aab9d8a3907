//! Application configuration.
//!
//! Built once at process start from the environment and injected into the
//! services that need it. There are no ambient globals and no insecure
//! defaults: a missing or short `SESSION_SECRET` is a startup failure, not a
//! silently substituted value.

use crate::{AppError, SecretString};

/// Minimum acceptable session secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Key material for the sealed session cookie. Required, >= 32 bytes.
    pub session_secret: SecretString,
    /// Static admin login id.
    pub admin_id: String,
    /// Static admin password.
    pub admin_password: SecretString,
    /// Base URL of the external relational datastore.
    pub datastore_url: String,
    /// API key for the datastore.
    pub datastore_key: SecretString,
    /// Optional Slack bot token for notifications.
    pub slack_bot_token: Option<SecretString>,
    /// Toggles the `Secure` cookie flag and the https scheme used for
    /// CSRF origin comparison.
    pub production: bool,
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or the
    /// session secret is shorter than [`MIN_SECRET_LEN`] bytes.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through a variable lookup function.
    ///
    /// Exists so tests can supply an isolated environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            session_secret: SecretString::new(require(&lookup, "SESSION_SECRET")?),
            admin_id: require(&lookup, "ADMIN_ID")?,
            admin_password: SecretString::new(require(&lookup, "ADMIN_PASSWORD")?),
            datastore_url: require(&lookup, "DATASTORE_URL")?,
            datastore_key: SecretString::new(require(&lookup, "DATASTORE_KEY")?),
            slack_bot_token: lookup("SLACK_BOT_TOKEN").map(SecretString::new),
            production: lookup("PRODUCTION").as_deref() == Some("true"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates invariants that cannot be expressed by construction.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.session_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// Origin of the external datastore, for the content-security-policy.
    ///
    /// Strips any path component: `https://ds.example.com/rest/v1` becomes
    /// `https://ds.example.com`.
    #[must_use]
    pub fn datastore_origin(&self) -> String {
        let url = &self.datastore_url;
        match url.find("://") {
            Some(scheme_end) => {
                let rest = &url[scheme_end + 3..];
                match rest.find('/') {
                    Some(path_start) => url[..scheme_end + 3 + path_start].to_owned(),
                    None => url.clone(),
                }
            }
            None => url.clone(),
        }
    }
}

fn require<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} is required")))
}
