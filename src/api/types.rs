use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::UserKind;

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateScreenRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(rename = "type")]
    pub kind: UserKind,
    pub login_id: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<crate::session::SessionUser> for MeResponse {
    fn from(user: crate::session::SessionUser) -> Self {
        MeResponse {
            kind: user.kind,
            login_id: user.login_id,
        }
    }
}
