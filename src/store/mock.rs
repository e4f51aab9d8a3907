//! In-memory datastore used by tests and local development.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    ClientAccount, CommentRecord, Datastore, FeedbackFilter, FeedbackItem, Reply, Screen,
};
use crate::validators::CommentStatus;
use crate::AppError;

#[derive(Debug, Clone, Default)]
pub struct MockDatastore {
    pub clients: Arc<Mutex<Vec<ClientAccount>>>,
    /// (client_id, project_id) assignment pairs.
    pub assignments: Arc<Mutex<Vec<(String, String)>>>,
    pub screens: Arc<Mutex<Vec<Screen>>>,
    pub comments: Arc<Mutex<Vec<CommentRecord>>>,
    pub replies: Arc<Mutex<Vec<Reply>>>,
    pub feedback: Arc<Mutex<Vec<FeedbackItem>>>,
    pub project_ids: Arc<Mutex<Vec<String>>>,
    pub healthy: Arc<Mutex<bool>>,
}

impl MockDatastore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(Mutex::new(true)),
            ..Default::default()
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }

    fn check_health(&self) -> Result<(), AppError> {
        if *self.healthy.lock().unwrap() {
            Ok(())
        } else {
            Err(AppError::Dependency("connection refused".to_owned()))
        }
    }
}

#[async_trait]
impl Datastore for MockDatastore {
    async fn find_client_by_login(
        &self,
        login_id: &str,
    ) -> Result<Option<ClientAccount>, AppError> {
        self.check_health()?;
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.login_id == login_id)
            .cloned())
    }

    async fn assigned_project_ids(&self, client_id: &str) -> Result<Vec<String>, AppError> {
        self.check_health()?;
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == client_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn screen(&self, screen_id: &str) -> Result<Option<Screen>, AppError> {
        self.check_health()?;
        Ok(self
            .screens
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == screen_id)
            .cloned())
    }

    async fn create_screen(&self, project_id: &str, name: &str) -> Result<Screen, AppError> {
        self.check_health()?;
        let screen = Screen {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_owned(),
            name: name.to_owned(),
        };
        self.screens.lock().unwrap().push(screen.clone());
        Ok(screen)
    }

    async fn delete_screen(&self, screen_id: &str) -> Result<(), AppError> {
        self.check_health()?;
        self.screens.lock().unwrap().retain(|s| s.id != screen_id);
        Ok(())
    }

    async fn comment(&self, comment_id: &str) -> Result<Option<CommentRecord>, AppError> {
        self.check_health()?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == comment_id)
            .cloned())
    }

    async fn create_reply(
        &self,
        comment_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<Reply, AppError> {
        self.check_health()?;
        let reply = Reply {
            id: Uuid::new_v4().to_string(),
            comment_id: comment_id.to_owned(),
            author_id: author_id.to_owned(),
            body: body.to_owned(),
            created_at: Utc::now(),
        };
        self.replies.lock().unwrap().push(reply.clone());
        Ok(reply)
    }

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackItem>, AppError> {
        self.check_health()?;
        let feedback = self.feedback.lock().unwrap();
        let skip = (filter.page.saturating_sub(1) as usize) * filter.per_page as usize;
        Ok(feedback
            .iter()
            .filter(|f| filter.status.is_none_or(|s| f.status == s))
            .skip(skip)
            .take(filter.per_page as usize)
            .cloned()
            .collect())
    }

    async fn feedback(&self, id: &str) -> Result<Option<FeedbackItem>, AppError> {
        self.check_health()?;
        Ok(self
            .feedback
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn set_feedback_status(
        &self,
        ids: &[String],
        status: CommentStatus,
    ) -> Result<u64, AppError> {
        self.check_health()?;
        let mut feedback = self.feedback.lock().unwrap();
        let mut updated = 0;
        for item in feedback.iter_mut() {
            if ids.contains(&item.id) {
                item.status = status;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_projects(&self, ids: &[String]) -> Result<u64, AppError> {
        self.check_health()?;
        let mut projects = self.project_ids.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| !ids.contains(p));
        Ok((before - projects.len()) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_health()
    }
}
