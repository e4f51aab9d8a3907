//! HTTP handlers for the auth-relevant API surface.
//!
//! The gatekeeper has already done coarse route/role checks and CSRF by the
//! time a request lands here; handlers perform the fine-grained work: input
//! validation, per-resource ownership, rate limits, and datastore calls.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;

use super::error::ApiError;
use super::routes::AppState;
use super::types::{
    BulkDeleteRequest, BulkDeleteResponse, BulkStatusRequest, BulkUpdateResponse,
    CreateReplyRequest, CreateScreenRequest, FeedbackQuery, HealthResponse, LoginRequest,
    MeResponse, OkResponse,
};
use crate::rate_limit::RateLimitResult;
use crate::session::authz::{has_project_access, is_admin};
use crate::session::SessionUser;
use crate::store::{Datastore, FeedbackFilter};
use crate::validators::{
    sanitize_text, validate_status, validate_text_length, validate_uuid, validate_uuids,
    ValidationError,
};
use crate::{crypto, AppError};

const MAX_REPLY_LEN: usize = 5000;
const MAX_SCREEN_NAME_LEN: usize = 255;
const MAX_BULK_STATUS_IDS: usize = 100;
const MAX_BULK_DELETE_IDS: usize = 50;

/// Authenticate against the static admin credential or a datastore-backed
/// client account, and set the session cookie.
///
/// POST /api/auth/login
pub async fn login<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let client_ip = extract_client_ip(&headers);
    throttle(&state, "login", &client_ip).await?;

    let user = authenticate(&state, &body).await?;

    let cookie = state.sessions.login_cookie(&user)?;
    log::info!(
        target: "reviewbase::auth",
        "msg=\"login\" login_id=\"{}\" kind=\"{:?}\"",
        user.login_id,
        user.kind
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MeResponse::from(user)),
    )
        .into_response())
}

async fn authenticate<S>(
    state: &AppState<S>,
    body: &LoginRequest,
) -> Result<SessionUser, AppError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    // Static admin credential first; both comparisons are constant-time.
    let config = &state.config;
    if crypto::constant_time_eq(body.id.as_bytes(), config.admin_id.as_bytes())
        && crypto::constant_time_eq(
            body.password.as_bytes(),
            config.admin_password.expose_secret().as_bytes(),
        )
    {
        return Ok(SessionUser::admin("admin", &config.admin_id));
    }

    let Some(client) = state.store.find_client_by_login(&body.id).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !crypto::verify_password(&body.password, &client.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    Ok(SessionUser::client(
        client.id,
        client.login_id,
        client.project_id,
    ))
}

/// Clear the session cookie. Idempotent.
///
/// POST /api/auth/logout
pub async fn logout<S>(State(state): State<AppState<S>>) -> Response
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    (
        [(header::SET_COOKIE, state.sessions.logout_cookie())],
        Json(OkResponse { ok: true }),
    )
        .into_response()
}

/// GET /api/auth/me
pub async fn me<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    // Public path: the gatekeeper does not decode the session here.
    let user = state
        .sessions
        .session_from_headers(&headers)
        .ok_or(AppError::Unauthenticated)?;

    Ok(Json(MeResponse::from(user)))
}

/// Paginated, filterable feedback list.
///
/// GET /api/feedback
pub async fn feedback_list<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;

    let status = query.status.as_deref().map(validate_status).transpose()?;
    let filter = FeedbackFilter {
        status,
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(20).clamp(1, 100),
    };

    let items = state.store.list_feedback(&filter).await?;
    Ok(Json(items).into_response())
}

/// GET /api/feedback/{id}
pub async fn feedback_detail<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;
    validate_uuid(&id, "feedback id")?;

    let item = state.store.feedback(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(item).into_response())
}

/// Bulk status update, up to 100 ids.
///
/// PATCH /api/feedback/bulk
pub async fn feedback_bulk<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Json(body): Json<BulkStatusRequest>,
) -> Result<Json<BulkUpdateResponse>, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;
    validate_id_batch(&body.ids, "feedback ids", MAX_BULK_STATUS_IDS)?;
    let status = validate_status(&body.status)?;

    let updated = state.store.set_feedback_status(&body.ids, status).await?;
    Ok(Json(BulkUpdateResponse { updated }))
}

/// Create a threaded reply on a comment. Rate limited per user; ownership
/// checked for client sessions against a freshly fetched assignment set.
///
/// POST /api/comments/{id}/replies
pub async fn create_reply<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Path(comment_id): Path<String>,
    Json(body): Json<CreateReplyRequest>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    validate_uuid(&comment_id, "comment id")?;
    throttle(&state, "reply", &user.id).await?;

    let text = sanitize_text(&body.text, MAX_REPLY_LEN);
    validate_text_length(&text, MAX_REPLY_LEN, "reply text")?;

    let comment = state
        .store
        .comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !is_admin(&user) {
        // A comment whose screen join did not resolve has no owning
        // project; clients are denied rather than guessed at.
        let Some(project_id) = comment.project_id() else {
            return Err(AppError::Forbidden.into());
        };
        let assigned = state.store.assigned_project_ids(&user.id).await?;
        if !has_project_access(Some(&user), project_id, &assigned) {
            return Err(AppError::Forbidden.into());
        }
    }

    let reply = state.store.create_reply(&comment_id, &user.id, &text).await?;
    Ok((StatusCode::CREATED, Json(reply)).into_response())
}

/// POST /api/projects/{id}/screens
pub async fn create_screen<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Path(project_id): Path<String>,
    Json(body): Json<CreateScreenRequest>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;
    validate_uuid(&project_id, "project id")?;

    let name = sanitize_text(&body.name, MAX_SCREEN_NAME_LEN);
    validate_text_length(&name, MAX_SCREEN_NAME_LEN, "screen name")?;

    let screen = state.store.create_screen(&project_id, &name).await?;
    Ok((StatusCode::CREATED, Json(screen)).into_response())
}

/// Bulk project delete, up to 50 ids.
///
/// DELETE /api/projects/bulk
pub async fn projects_bulk_delete<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Json(body): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;
    validate_id_batch(&body.ids, "project ids", MAX_BULK_DELETE_IDS)?;

    let deleted = state.store.delete_projects(&body.ids).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

/// GET /api/screens/{id} — any session, ownership-checked for clients.
pub async fn screen_get<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    validate_uuid(&id, "screen id")?;

    let screen = state.store.screen(&id).await?.ok_or(AppError::NotFound)?;

    if !is_admin(&user) {
        let assigned = state.store.assigned_project_ids(&user.id).await?;
        if !has_project_access(Some(&user), &screen.project_id, &assigned) {
            return Err(AppError::Forbidden.into());
        }
    }

    Ok(Json(screen).into_response())
}

/// DELETE /api/screens/{id} — admin only.
pub async fn screen_delete<S>(
    State(state): State<AppState<S>>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    let user = require_session(user)?;
    require_admin(&user)?;
    validate_uuid(&id, "screen id")?;

    state.store.screen(&id).await?.ok_or(AppError::NotFound)?;
    state.store.delete_screen(&id).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// GET /api/health — 200 when the datastore answers, 503 otherwise.
pub async fn health<S>(State(state): State<AppState<S>>) -> Response
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
                timestamp: Utc::now(),
            }),
        )
            .into_response(),
        Err(err) => {
            log::error!(
                target: "reviewbase::api",
                "msg=\"health check failed\" detail=\"{err}\""
            );
            let database = match err {
                AppError::Dependency(_) => "unreachable",
                _ => "error",
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "error",
                    database,
                    timestamp: Utc::now(),
                }),
            )
                .into_response()
        }
    }
}

// Shared helpers

fn require_session(user: Option<Extension<SessionUser>>) -> Result<SessionUser, ApiError> {
    user.map(|Extension(user)| user)
        .ok_or_else(|| AppError::Unauthenticated.into())
}

fn require_admin(user: &SessionUser) -> Result<(), ApiError> {
    if is_admin(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden.into())
    }
}

fn validate_id_batch(ids: &[String], label: &str, max: usize) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Err(ValidationError::Empty {
            label: label.to_owned(),
        }
        .into());
    }
    if ids.len() > max {
        return Err(ValidationError::TooManyIds {
            label: label.to_owned(),
            max,
        }
        .into());
    }
    validate_uuids(ids, label)?;
    Ok(())
}

async fn throttle<S>(state: &AppState<S>, limit_name: &str, key: &str) -> Result<(), ApiError>
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    match state.limiter.check(limit_name, key).await? {
        RateLimitResult::Allowed { .. } => Ok(()),
        RateLimitResult::Limited { retry_after, .. } => {
            Err(AppError::RateLimited { retry_after }.into())
        }
    }
}

fn extract_client_ip(headers: &HeaderMap) -> String {
    // X-Forwarded-For first (for proxied requests); it can contain multiple
    // addresses, the first is the client.
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_owned();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return value.trim().to_owned();
        }
    }

    "unknown".to_owned()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_extract_client_ip_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.5, 10.0.0.1"),
        );
        assert_eq!(extract_client_ip(&headers), "203.0.113.5");
    }

    #[test]
    fn test_extract_client_ip_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(extract_client_ip(&headers), "198.51.100.7");
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        assert_eq!(extract_client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_validate_id_batch_limits() {
        let good = vec!["550e8400-e29b-41d4-a716-446655440000".to_owned()];
        assert!(validate_id_batch(&good, "ids", 2).is_ok());
        assert!(validate_id_batch(&[], "ids", 2).is_err());

        let too_many: Vec<String> = (0..3)
            .map(|_| "550e8400-e29b-41d4-a716-446655440000".to_owned())
            .collect();
        assert!(validate_id_batch(&too_many, "ids", 2).is_err());

        let malformed = vec!["bad".to_owned()];
        assert!(validate_id_batch(&malformed, "ids", 2).is_err());
    }
}
