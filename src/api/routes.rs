use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};

use super::handlers;
use crate::gatekeeper::{gatekeeper, GatekeeperContext};
use crate::rate_limit::{InMemoryStore, Limit, RateLimiter};
use crate::session::{SessionConfig, SessionService};
use crate::store::Datastore;
use crate::AppConfig;

#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub sessions: Arc<SessionService>,
    pub limiter: RateLimiter,
    pub config: Arc<AppConfig>,
}

impl<S> AppState<S> {
    /// Wires the standard services from configuration: a session service
    /// using the configured secret, and the login/reply rate limits.
    pub fn new(store: S, config: AppConfig) -> Self {
        let sessions = SessionService::new(SessionConfig {
            cookie_secure: config.production,
            secret_key: config.session_secret.clone(),
            ..Default::default()
        });

        let limiter = RateLimiter::new(Arc::new(InMemoryStore::new()))
            .for_("login", Limit::per_minute(5).message("Too many login attempts"))
            .for_("reply", Limit::per_minute(15).message("Too many replies"));

        Self {
            store,
            sessions: Arc::new(sessions),
            limiter,
            config: Arc::new(config),
        }
    }
}

impl<S: Clone> FromRef<AppState<S>> for GatekeeperContext {
    fn from_ref(state: &AppState<S>) -> Self {
        GatekeeperContext {
            sessions: Arc::clone(&state.sessions),
            config: Arc::clone(&state.config),
        }
    }
}

/// Assembles the full router with the gatekeeper wrapped around every route.
pub fn app_router<S>(state: AppState<S>) -> Router
where
    S: Datastore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/auth/login", post(handlers::login::<S>))
        .route("/api/auth/logout", post(handlers::logout::<S>))
        .route("/api/auth/me", get(handlers::me::<S>))
        .route("/api/feedback", get(handlers::feedback_list::<S>))
        .route("/api/feedback/bulk", patch(handlers::feedback_bulk::<S>))
        .route("/api/feedback/{id}", get(handlers::feedback_detail::<S>))
        .route(
            "/api/comments/{id}/replies",
            post(handlers::create_reply::<S>),
        )
        .route(
            "/api/projects/bulk",
            delete(handlers::projects_bulk_delete::<S>),
        )
        .route(
            "/api/projects/{id}/screens",
            post(handlers::create_screen::<S>),
        )
        .route(
            "/api/screens/{id}",
            get(handlers::screen_get::<S>).delete(handlers::screen_delete::<S>),
        )
        .route("/api/health", get(handlers::health::<S>))
        .fallback(render_page)
        .layer(middleware::from_fn_with_state(state.clone(), gatekeeper))
        .with_state(state)
}

/// Stand-in for the page-rendering layer, which lives outside this crate.
/// The gatekeeper still guards these paths: unauthenticated requests to the
/// admin or client areas never reach this handler.
async fn render_page() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}
