//! Port to the external relational datastore.
//!
//! Persistence is an external collaborator: handlers talk to this trait and
//! nothing else. Join-shaped results are modeled as explicit optional nested
//! records — a join that returns rows yields the first element, an empty join
//! reads as absent — instead of ad hoc runtime shape-checking.

mod mock;

pub use mock::MockDatastore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validators::CommentStatus;
use crate::AppError;

/// A client account row. `password_hash` is bcrypt, or plaintext for
/// accounts predating the hashing rollout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAccount {
    pub id: String,
    pub login_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Primary project carried into the session for convenience; the
    /// authoritative assignment set is always fetched per decision.
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    pub project_id: String,
    pub name: String,
}

/// The screen side of a comment/feedback join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRef {
    pub id: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub status: CommentStatus,
    /// Absent when the joined screen row no longer exists.
    pub screen: Option<ScreenRef>,
}

impl CommentRecord {
    /// Owning project, when the join resolved.
    pub fn project_id(&self) -> Option<&str> {
        self.screen.as_ref().map(|s| s.project_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub comment_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: String,
    pub body: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub screen: Option<ScreenRef>,
}

/// Admin feedback list filter. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct FeedbackFilter {
    pub status: Option<CommentStatus>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for FeedbackFilter {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: 20,
        }
    }
}

/// Query API of the external datastore.
///
/// Implementations must be cheap to clone or wrapped in `Arc` by the caller;
/// every method maps an I/O failure to `AppError::Dependency`.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn find_client_by_login(&self, login_id: &str)
        -> Result<Option<ClientAccount>, AppError>;

    /// The client's assigned-project set (`client_account_projects`).
    /// Fetched fresh per authorization decision; never cached.
    async fn assigned_project_ids(&self, client_id: &str) -> Result<Vec<String>, AppError>;

    async fn screen(&self, screen_id: &str) -> Result<Option<Screen>, AppError>;

    async fn create_screen(&self, project_id: &str, name: &str) -> Result<Screen, AppError>;

    async fn delete_screen(&self, screen_id: &str) -> Result<(), AppError>;

    async fn comment(&self, comment_id: &str) -> Result<Option<CommentRecord>, AppError>;

    async fn create_reply(
        &self,
        comment_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<Reply, AppError>;

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackItem>, AppError>;

    async fn feedback(&self, id: &str) -> Result<Option<FeedbackItem>, AppError>;

    /// Returns the number of rows updated.
    async fn set_feedback_status(
        &self,
        ids: &[String],
        status: CommentStatus,
    ) -> Result<u64, AppError>;

    /// Returns the number of projects deleted.
    async fn delete_projects(&self, ids: &[String]) -> Result<u64, AppError>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
