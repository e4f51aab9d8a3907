//! Edge middleware: every request passes through here before any handler.
//!
//! Evaluation order is load-bearing and must not be rearranged:
//!
//! 1. Public paths (login page, auth sub-paths, health) skip straight to
//!    security headers.
//! 2. CSRF origin verification for mutating API calls. Runs before session
//!    decode so a forged cross-origin mutation is rejected without ever
//!    reading the cookie.
//! 3. Session decode for protected prefixes: 401 JSON for API paths,
//!    redirect to the login page for page paths.
//! 4. Role/route matching: the admin area requires an admin session, the
//!    client area a client session.
//! 5. Security headers on every response, public paths included.

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::session::{SessionUser, UserKind};
use crate::{AppConfig, SessionService};

/// The slice of application state the gatekeeper needs.
#[derive(Clone)]
pub struct GatekeeperContext {
    pub sessions: Arc<SessionService>,
    pub config: Arc<AppConfig>,
}

/// Coarse route classification driving the protection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a session.
    Public,
    /// Admin area pages.
    AdminPage,
    /// Client area pages.
    ClientPage,
    /// Protected API paths.
    Api,
    /// Anything else (marketing pages, assets).
    Open,
}

pub fn classify(path: &str) -> RouteClass {
    if path == "/login"
        || path.starts_with("/api/auth/")
        || path == "/api/health"
    {
        return RouteClass::Public;
    }
    if path == "/admin" || path.starts_with("/admin/") {
        return RouteClass::AdminPage;
    }
    if path == "/client" || path.starts_with("/client/") {
        return RouteClass::ClientPage;
    }
    if path.starts_with("/api/") {
        return RouteClass::Api;
    }
    RouteClass::Open
}

fn is_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// Verifies the `Origin` header of a mutating API call against the request's
/// own origin. A missing Origin on a browser-issued mutating fetch is
/// atypical, so absence fails closed.
pub fn origin_allowed(headers: &axum::http::HeaderMap, production: bool) -> bool {
    let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let scheme = if production { "https" } else { "http" };
    origin == format!("{scheme}://{host}")
}

pub async fn gatekeeper(
    State(ctx): State<GatekeeperContext>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let class = classify(&path);

    if class == RouteClass::Public {
        let mut response = next.run(request).await;
        apply_security_headers(&mut response, &ctx.config);
        return response;
    }

    if class == RouteClass::Api && is_mutating(request.method()) {
        if !origin_allowed(request.headers(), ctx.config.production) {
            log::warn!(
                target: "reviewbase::gatekeeper",
                "msg=\"CSRF rejected\" path=\"{path}\""
            );
            let mut response = (
                StatusCode::FORBIDDEN,
                Json(json!({"error": "CSRF rejected"})),
            )
                .into_response();
            apply_security_headers(&mut response, &ctx.config);
            return response;
        }
    }

    let session = ctx.sessions.session_from_headers(request.headers());

    let mut response = match class {
        RouteClass::AdminPage | RouteClass::ClientPage | RouteClass::Api => {
            match session {
                None => rejection_for(class),
                Some(user) => match role_redirect(class, &user) {
                    Some(response) => response,
                    None => {
                        request.extensions_mut().insert(user);
                        next.run(request).await
                    }
                },
            }
        }
        RouteClass::Public | RouteClass::Open => {
            if let Some(user) = session {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
    };

    apply_security_headers(&mut response, &ctx.config);
    response
}

/// 401 JSON for API paths, redirect to the login page for page paths.
fn rejection_for(class: RouteClass) -> Response {
    match class {
        RouteClass::Api => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authentication required"})),
        )
            .into_response(),
        _ => redirect_to("/login"),
    }
}

/// Sends a session to its own area when it lands in the other role's pages.
fn role_redirect(class: RouteClass, user: &SessionUser) -> Option<Response> {
    match (class, user.kind) {
        (RouteClass::AdminPage, UserKind::Client) => Some(redirect_to("/client")),
        (RouteClass::ClientPage, UserKind::Admin) => Some(redirect_to("/admin")),
        _ => None,
    }
}

fn redirect_to(location: &str) -> Response {
    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, HeaderValue::from_str(location).unwrap_or(HeaderValue::from_static("/login")))],
    )
        .into_response()
}

/// Attached to every response on every path, rejections included.
pub fn apply_security_headers(response: &mut Response, config: &AppConfig) {
    let headers = response.headers_mut();

    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=63072000; includeSubDomains"),
    );

    let datastore_origin = config.datastore_origin();
    let csp = format!(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: {datastore_origin}; connect-src 'self' {datastore_origin}"
    );
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(header::CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        header::HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );
}
