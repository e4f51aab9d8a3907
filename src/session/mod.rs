pub mod authz;
pub mod config;
pub mod seal;
pub mod service;

pub use config::{SameSite, SessionConfig};
pub use service::SessionService;

use serde::{Deserialize, Serialize};

/// Role carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Admin,
    Client,
}

/// The session payload sealed into the cookie.
///
/// The server holds no session store: the cookie is the session, so this
/// record is immutable once sealed and its integrity is enforced
/// cryptographically by the codec rather than by lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "type")]
    pub kind: UserKind,
    pub id: String,
    pub login_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl SessionUser {
    pub fn admin(id: impl Into<String>, login_id: impl Into<String>) -> Self {
        Self {
            kind: UserKind::Admin,
            id: id.into(),
            login_id: login_id.into(),
            project_id: None,
        }
    }

    pub fn client(
        id: impl Into<String>,
        login_id: impl Into<String>,
        project_id: Option<String>,
    ) -> Self {
        Self {
            kind: UserKind::Client,
            id: id.into(),
            login_id: login_id.into(),
            project_id,
        }
    }
}
