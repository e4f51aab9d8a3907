pub mod api;
pub mod config;
pub mod crypto;
pub mod gatekeeper;
pub mod rate_limit;
pub mod secret;
pub mod session;
pub mod store;
pub mod validators;

pub use config::AppConfig;
pub use secret::SecretString;
pub use session::authz::{has_project_access, is_admin};
pub use session::service::SessionService;
pub use session::{SessionUser, UserKind};
pub use store::{Datastore, MockDatastore};

use std::fmt;

/// Error taxonomy for the security core.
///
/// Handlers branch on these explicitly; the HTTP mapping lives in
/// `api::error`. Internal detail (`Config`, `Dependency`) is logged
/// server-side and never reaches a client response body.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Missing or invalid configuration. Fatal at startup or first use.
    Config(String),
    /// Malformed input the caller can correct.
    Validation(String),
    /// No session or an invalid one.
    Unauthenticated,
    /// Login id/password mismatch. Deliberately does not say which.
    InvalidCredentials,
    /// Valid session, insufficient rights or ownership.
    Forbidden,
    /// Cross-origin mutation rejected before any session work.
    CsrfRejected,
    /// Too many attempts; recoverable once the window passes.
    RateLimited { retry_after: i64 },
    NotFound,
    /// External datastore unreachable or erroring.
    Dependency(String),
}

impl std::error::Error for AppError {}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::Unauthenticated => write!(f, "Authentication required"),
            AppError::InvalidCredentials => write!(f, "Invalid id or password"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::CsrfRejected => write!(f, "CSRF rejected"),
            AppError::RateLimited { .. } => {
                write!(f, "Too many requests. Please try again later.")
            }
            AppError::NotFound => write!(f, "Not found"),
            AppError::Dependency(msg) => write!(f, "Datastore error: {msg}"),
        }
    }
}

impl From<validators::ValidationError> for AppError {
    fn from(err: validators::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}
