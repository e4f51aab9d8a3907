//! End-to-end tests over the assembled router with the in-memory datastore.
//!
//! Every request goes through the gatekeeper, so these exercise the CSRF
//! check, session decode, role matching and security headers together with
//! the handlers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reviewbase::api::{app_router, AppState};
use reviewbase::store::{ClientAccount, CommentRecord, FeedbackItem, Screen, ScreenRef};
use reviewbase::validators::CommentStatus;
use reviewbase::{AppConfig, MockDatastore};
use tower::ServiceExt;

const P1: &str = "11111111-1111-4111-8111-111111111111";
const P2: &str = "99999999-9999-4999-8999-999999999999";
const S1: &str = "22222222-2222-4222-8222-222222222222";
const S2: &str = "33333333-3333-4333-8333-333333333333";
const CM1: &str = "44444444-4444-4444-8444-444444444444";
const CM2: &str = "55555555-5555-4555-8555-555555555555";
const F1: &str = "66666666-6666-4666-8666-666666666666";

// bcrypt's MIN_COST (4) is private in the crate, so mirror it here.
const MIN_COST: u32 = 4;

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|name| match name {
        "SESSION_SECRET" => Some("e2e-test-session-secret-of-32-bytes!".to_owned()),
        "ADMIN_ID" => Some("admin-login".to_owned()),
        "ADMIN_PASSWORD" => Some("admin-pass".to_owned()),
        "DATASTORE_URL" => Some("http://ds.internal:8000/rest/v1".to_owned()),
        "DATASTORE_KEY" => Some("ds-key".to_owned()),
        _ => None,
    })
    .unwrap()
}

fn seeded_store() -> MockDatastore {
    let store = MockDatastore::new();

    // bcrypt MIN_COST keeps the test suite fast; production uses DEFAULT_COST
    let hash = bcrypt::hash("client-pass", MIN_COST).unwrap();
    store.clients.lock().unwrap().push(ClientAccount {
        id: "c1".to_owned(),
        login_id: "client-a".to_owned(),
        password_hash: hash,
        project_id: Some(P1.to_owned()),
    });
    store.clients.lock().unwrap().push(ClientAccount {
        id: "c2".to_owned(),
        login_id: "legacy".to_owned(),
        password_hash: "legacy-pass".to_owned(),
        project_id: Some(P1.to_owned()),
    });
    store
        .assignments
        .lock()
        .unwrap()
        .push(("c1".to_owned(), P1.to_owned()));

    let mut screens = store.screens.lock().unwrap();
    screens.push(Screen {
        id: S1.to_owned(),
        project_id: P1.to_owned(),
        name: "Landing v1".to_owned(),
    });
    screens.push(Screen {
        id: S2.to_owned(),
        project_id: P2.to_owned(),
        name: "Other tenant".to_owned(),
    });
    drop(screens);

    let mut comments = store.comments.lock().unwrap();
    comments.push(CommentRecord {
        id: CM1.to_owned(),
        status: CommentStatus::Open,
        screen: Some(ScreenRef {
            id: S1.to_owned(),
            project_id: P1.to_owned(),
        }),
    });
    comments.push(CommentRecord {
        id: CM2.to_owned(),
        status: CommentStatus::Open,
        screen: Some(ScreenRef {
            id: S2.to_owned(),
            project_id: P2.to_owned(),
        }),
    });
    drop(comments);

    store.feedback.lock().unwrap().push(FeedbackItem {
        id: F1.to_owned(),
        body: "pin comment".to_owned(),
        status: CommentStatus::Open,
        created_at: chrono::Utc::now(),
        screen: Some(ScreenRef {
            id: S1.to_owned(),
            project_id: P1.to_owned(),
        }),
    });

    store
}

fn create_app() -> (Router, MockDatastore) {
    let store = seeded_store();
    let state = AppState::new(store.clone(), test_config());
    (app_router(state), store)
}

fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "example.com");

    // Mutating requests carry a matching Origin unless a test removes it
    if !matches!(method, "GET" | "HEAD") {
        builder = builder.header(header::ORIGIN, "http://example.com");
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Logs in and returns the `name=value` session cookie pair.
async fn login_as(app: &Router, id: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"id": id, "password": password})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "login failed for {id}");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

// Authentication

#[tokio::test]
async fn test_admin_login_sets_session_cookie() {
    let (app, _) = create_app();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"id": "admin-login", "password": "admin-pass"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("rb_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let body = body_json(response.into_body()).await;
    assert_eq!(body["type"], "admin");
    assert_eq!(body["login_id"], "admin-login");
}

#[tokio::test]
async fn test_client_login_bcrypt_and_legacy() {
    let (app, _) = create_app();

    let cookie = login_as(&app, "client-a", "client-pass").await;
    let response = app
        .clone()
        .oneshot(with_cookie(request("GET", "/api/auth/me", None), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["type"], "client");

    // Account predating the hashing rollout still logs in
    login_as(&app, "legacy", "legacy-pass").await;
}

#[tokio::test]
async fn test_login_wrong_password_is_401() {
    let (app, _) = create_app();

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"id": "client-a", "password": "wrong"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rate_limited_on_sixth_attempt() {
    let (app, _) = create_app();

    for attempt in 1..=5 {
        let mut req = request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"id": "client-a", "password": "wrong"})),
        );
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "attempt {attempt} should still be a credential failure"
        );
    }

    let mut req = request(
        "POST",
        "/api/auth/login",
        Some(serde_json::json!({"id": "client-a", "password": "wrong"})),
    );
    req.headers_mut()
        .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // A different address is unaffected
    let mut req = request(
        "POST",
        "/api/auth/login",
        Some(serde_json::json!({"id": "client-a", "password": "wrong"})),
    );
    req.headers_mut()
        .insert("x-forwarded-for", "203.0.113.10".parse().unwrap());
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = create_app();

    let response = app
        .oneshot(request("POST", "/api/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("rb_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    let body = body_json(response.into_body()).await;
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_me_without_session_is_401() {
    let (app, _) = create_app();

    let response = app
        .oneshot(request("GET", "/api/auth/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// Gatekeeper

#[tokio::test]
async fn test_csrf_rejected_before_session_check() {
    let (app, _) = create_app();

    // No session cookie and no Origin: a pure 401 would mean the session was
    // checked first; the contract is 403 CSRF
    let req = Request::builder()
        .method("PATCH")
        .uri("/api/feedback/bulk")
        .header(header::HOST, "example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "CSRF rejected");

    // Mismatched origin is rejected the same way
    let req = Request::builder()
        .method("PATCH")
        .uri("/api/feedback/bulk")
        .header(header::HOST, "example.com")
        .header(header::ORIGIN, "http://evil.example.net")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_api_without_session_is_401_json() {
    let (app, _) = create_app();

    let response = app
        .oneshot(request("GET", "/api/feedback", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_page_paths_redirect_to_login_without_session() {
    let (app, _) = create_app();

    let response = app
        .oneshot(request("GET", "/admin/projects", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_role_route_matching_redirects() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;
    let client = login_as(&app, "client-a", "client-pass").await;

    let response = app
        .clone()
        .oneshot(with_cookie(request("GET", "/admin", None), &client))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/client");

    let response = app
        .clone()
        .oneshot(with_cookie(request("GET", "/client", None), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin");

    let response = app
        .oneshot(with_cookie(request("GET", "/admin", None), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (app, _) = create_app();

    // Public path
    let response = app
        .clone()
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
        "max-age=63072000; includeSubDomains"
    );
    let csp = headers
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.contains("default-src 'self'"));
    assert!(csp.contains("http://ds.internal:8000"));
    assert_eq!(headers.get("x-dns-prefetch-control").unwrap(), "off");

    // CSRF rejection carries them too
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/projects/bulk")
        .header(header::HOST, "example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response
        .headers()
        .contains_key(header::STRICT_TRANSPORT_SECURITY));
}

// Ownership

#[tokio::test]
async fn test_screen_access_is_tenant_scoped() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;
    let client = login_as(&app, "client-a", "client-pass").await;

    // Client can read its own project's screen
    let response = app
        .clone()
        .oneshot(with_cookie(
            request("GET", &format!("/api/screens/{S1}"), None),
            &client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Guessing another tenant's UUID is a 403
    let response = app
        .clone()
        .oneshot(with_cookie(
            request("GET", &format!("/api/screens/{S2}"), None),
            &client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin reads any screen regardless of assignment
    let response = app
        .oneshot(with_cookie(
            request("GET", &format!("/api/screens/{S2}"), None),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reply_ownership_and_sanitization() {
    let (app, store) = create_app();
    let client = login_as(&app, "client-a", "client-pass").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            request(
                "POST",
                &format!("/api/comments/{CM1}/replies"),
                Some(serde_json::json!({"text": "<script>x</script>hello   world"})),
            ),
            &client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["body"], "hello world");
    assert_eq!(store.replies.lock().unwrap().len(), 1);

    // Comment on another tenant's screen
    let response = app
        .oneshot(with_cookie(
            request(
                "POST",
                &format!("/api/comments/{CM2}/replies"),
                Some(serde_json::json!({"text": "should not land"})),
            ),
            &client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.replies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reply_rate_limited_per_user() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;

    for attempt in 1..=15 {
        let response = app
            .clone()
            .oneshot(with_cookie(
                request(
                    "POST",
                    &format!("/api/comments/{CM1}/replies"),
                    Some(serde_json::json!({"text": format!("reply {attempt}")})),
                ),
                &admin,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED, "reply {attempt}");
    }

    let response = app
        .oneshot(with_cookie(
            request(
                "POST",
                &format!("/api/comments/{CM1}/replies"),
                Some(serde_json::json!({"text": "one too many"})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_reply_rejects_empty_after_sanitization() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;

    let response = app
        .oneshot(with_cookie(
            request(
                "POST",
                &format!("/api/comments/{CM1}/replies"),
                Some(serde_json::json!({"text": "<b></b>   "})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// Admin resources

#[tokio::test]
async fn test_feedback_endpoints_are_admin_only() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;
    let client = login_as(&app, "client-a", "client-pass").await;

    let response = app
        .clone()
        .oneshot(with_cookie(request("GET", "/api/feedback", None), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(with_cookie(request("GET", "/api/feedback", None), &client))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(with_cookie(
            request("GET", "/api/feedback/not-a-uuid", None),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(with_cookie(
            request(
                "GET",
                "/api/feedback/77777777-7777-4777-8777-777777777777",
                None,
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_bulk_status_update() {
    let (app, store) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            request(
                "PATCH",
                "/api/feedback/bulk",
                Some(serde_json::json!({"ids": [F1], "status": "resolved"})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["updated"], 1);
    assert_eq!(
        store.feedback.lock().unwrap()[0].status,
        CommentStatus::Resolved
    );

    // Unknown status never reaches the store
    let response = app
        .oneshot(with_cookie(
            request(
                "PATCH",
                "/api/feedback/bulk",
                Some(serde_json::json!({"ids": [F1], "status": "closed"})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_screen_sanitizes_name() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;

    let response = app
        .oneshot(with_cookie(
            request(
                "POST",
                &format!("/api/projects/{P1}/screens"),
                Some(serde_json::json!({"name": "  Checkout <b>final</b>  "})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["name"], "Checkout final");
    assert_eq!(body["project_id"], P1);
}

#[tokio::test]
async fn test_screen_delete_admin_only() {
    let (app, _) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;
    let client = login_as(&app, "client-a", "client-pass").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            request("DELETE", &format!("/api/screens/{S1}"), None),
            &client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(with_cookie(
            request("DELETE", &format!("/api/screens/{S1}"), None),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(with_cookie(
            request("GET", &format!("/api/screens/{S1}"), None),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_projects_bulk_delete_caps_batch() {
    let (app, store) = create_app();
    let admin = login_as(&app, "admin-login", "admin-pass").await;
    store.project_ids.lock().unwrap().push(P2.to_owned());

    let too_many: Vec<String> = (0..51).map(|_| P2.to_owned()).collect();
    let response = app
        .clone()
        .oneshot(with_cookie(
            request(
                "DELETE",
                "/api/projects/bulk",
                Some(serde_json::json!({"ids": too_many})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(with_cookie(
            request(
                "DELETE",
                "/api/projects/bulk",
                Some(serde_json::json!({"ids": [P2]})),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["deleted"], 1);
}

// Health

#[tokio::test]
async fn test_health_reflects_datastore_state() {
    let (app, store) = create_app();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");

    store.set_healthy(false);
    let response = app
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["database"], "unreachable");
}
