//! End-to-end tests driving the full router over in-memory requests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use serde_json::{Value, json};
use skillweave::api::{self, AppState};
use skillweave::auth::JwtVerifier;
use skillweave::config::ServerConfig;
use skillweave::storage::Storage;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const JWT_SECRET: &str = "test-secret";

const DEMO_HASH: &str = "sha256:311bf7b773261f50f85145f553ac0ea393044607e83e7c91485f9fa28c0f69ae";
const DEMO_V2_HASH: &str = "sha256:5d940924d9b356ea808092f84d7bebff7f0b6ea49e5f6085e0f2ab9b42e5b495";

fn test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.redb");
    let storage = Arc::new(Storage::new(db_path.to_str().unwrap()).unwrap());
    let state = AppState::new(storage, Some(Arc::new(JwtVerifier::new(JWT_SECRET))), false);
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        db_path: String::new(),
        cors_origins: Vec::new(),
        jwt_secret: Some(JWT_SECRET.to_string()),
        secure_cookies: false,
    };
    (api::router(state, &config), temp_dir)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Sign up and log in, returning the session cookie.
async fn login_as(app: &Router, username: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/signup",
        None,
        Some(json!({
            "username": username,
            "display_name": format!("{username} display"),
            "email": format!("{username}@example.com"),
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": username })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

async fn publish_skill(app: &Router, cookie: &str, name: &str, body: Value) -> Value {
    let mut submission = json!({
        "title": format!("{name} title"),
        "name": name,
        "skill_content": "# Demo",
    });
    if let (Value::Object(base), Value::Object(extra)) = (&mut submission, body) {
        base.extend(extra);
    }
    let response = send(app, "POST", "/api/skills", Some(cookie), Some(submission)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    email: &'a str,
    exp: i64,
}

fn issue_token(subject: &str, email: &str) -> String {
    let claims = TestClaims {
        sub: subject,
        email,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let (app, _tmp) = test_app();
    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_and_login_issue_session() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    assert!(cookie.starts_with("session="));

    let response = send(&app, "GET", "/api/dashboard", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["profile"]["username"], "alice");

    let response = send(&app, "GET", "/api/dashboard", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_response_carries_cookie_and_user_body() {
    let (app, _tmp) = test_app();
    let response = send(
        &app,
        "POST",
        "/api/signup",
        None,
        Some(json!({
            "username": "dana",
            "display_name": "Dana",
            "email": "dana@example.com",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "dana" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("session="));

    // The same response owns the user payload outright.
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "dana");
    assert_eq!(body["user"]["display_name"], "Dana");
    assert!(body["user"]["id"].is_string());
}

#[tokio::test]
async fn token_login_creates_then_reuses_account() {
    let (app, _tmp) = test_app();
    let token = issue_token("provider-sub-1", "carol@example.com");

    // First login must carry a username for account creation.
    let response = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "credential": token })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({
            "credential": token,
            "username": "carol",
            "display_name": "Carol",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    // Subsequent logins resolve the same account by subject.
    let response = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "credential": token })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user_id.as_str());
}

#[tokio::test]
async fn publish_and_resolve_skill() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    let response = send(&app, "GET", "/api/skills/alice/demo", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["skill"]["version"], "1.0.0");
    assert_eq!(body["skill"]["content_hash"], DEMO_HASH);
    assert_eq!(body["skill"]["installs"], 0);
    assert_eq!(body["skill"]["files"][0]["name"], "SKILL.md");
    assert_eq!(body["skill"]["files"][0]["content"], "# Demo");
    assert_eq!(body["skill"]["author"]["username"], "alice");
    assert!(body.get("plugin").is_none());
}

#[tokio::test]
async fn plugin_format_adds_manifest() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    let response = send(
        &app,
        "GET",
        "/api/skills/alice/demo?format=plugin",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["plugin"]["name"], "alice-demo");
    assert_eq!(body["plugin"]["version"], "1.0.0");
    assert_eq!(body["plugin"]["skills"]["demo"]["files"][0], "SKILL.md");
}

#[tokio::test]
async fn editing_bumps_patch_version() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    let created = publish_skill(&app, &cookie, "demo", json!({})).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/api/skills/{id}"),
        Some(&cookie),
        Some(json!({
            "title": "demo title",
            "name": "demo",
            "skill_content": "# Demo v2",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/skills/alice/demo", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["skill"]["version"], "1.0.1");
    assert_eq!(body["skill"]["content_hash"], DEMO_V2_HASH);
}

#[tokio::test]
async fn duplicate_skill_name_conflicts() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    let response = send(
        &app,
        "POST",
        "/api/skills",
        Some(&cookie),
        Some(json!({
            "title": "demo again",
            "name": "demo",
            "skill_content": "# Other",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 409);
}

#[tokio::test]
async fn editing_someone_elses_skill_is_forbidden() {
    let (app, _tmp) = test_app();
    let alice = login_as(&app, "alice").await;
    let created = publish_skill(&app, &alice, "demo", json!({})).await;
    let id = created["id"].as_str().unwrap();

    let bob = login_as(&app, "bob").await;
    let response = send(
        &app,
        "PUT",
        &format!("/api/skills/{id}"),
        Some(&bob),
        Some(json!({
            "title": "hijack",
            "name": "demo",
            "skill_content": "# Hijacked",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The published content is untouched.
    let response = send(&app, "GET", "/api/skills/alice/demo", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["skill"]["version"], "1.0.0");
    assert_eq!(body["skill"]["content_hash"], DEMO_HASH);
}

#[tokio::test]
async fn unauthenticated_publish_is_rejected() {
    let (app, _tmp) = test_app();
    let response = send(
        &app,
        "POST",
        "/api/skills",
        None,
        Some(json!({
            "title": "demo",
            "name": "demo",
            "skill_content": "# Demo",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn raw_endpoint_serves_primary_file() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    let response = send(&app, "GET", "/api/skills/alice/demo/raw", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/markdown")
    );
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"# Demo");

    let response = send(
        &app,
        "GET",
        "/api/skills/alice/demo/raw?download=true",
        None,
        None,
    )
    .await;
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert_eq!(disposition, "attachment; filename=\"SKILL.md\"");
}

#[tokio::test]
async fn install_endpoint_counts() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    for expected in 1..=2u64 {
        let response = send(&app, "POST", "/api/skills/alice/demo/install", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["installs"], expected);
    }

    let response = send(&app, "GET", "/api/skills/alice/demo", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["skill"]["installs"], 2);
}

#[tokio::test]
async fn plugin_bundle_flow() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    let first = publish_skill(&app, &cookie, "alpha", json!({})).await;
    let second = publish_skill(&app, &cookie, "beta", json!({})).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let response = send(
        &app,
        "POST",
        "/api/plugins",
        Some(&cookie),
        Some(json!({ "title": "Kit", "name": "kit" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let plugin = body_json(response).await;
    let plugin_id = plugin["id"].as_str().unwrap();

    // Links are stored in the submitted order.
    let response = send(
        &app,
        "PUT",
        &format!("/api/plugins/{plugin_id}/skills"),
        Some(&cookie),
        Some(json!({ "skill_ids": [second_id, first_id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/plugins/alice/kit", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["skills"].as_array().unwrap().len(), 2);
    assert_eq!(body["skills"][0]["name"], "beta");
    assert_eq!(body["skills"][1]["name"], "alpha");

    // Replacing the list drops links that are no longer present.
    let response = send(
        &app,
        "PUT",
        &format!("/api/plugins/{plugin_id}/skills"),
        Some(&cookie),
        Some(json!({ "skill_ids": [first_id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/plugins/alice/kit", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["skills"].as_array().unwrap().len(), 1);
    assert_eq!(body["skills"][0]["name"], "alpha");
}

#[tokio::test]
async fn linking_unknown_skill_is_rejected() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;

    let response = send(
        &app,
        "POST",
        "/api/plugins",
        Some(&cookie),
        Some(json!({ "title": "Kit", "name": "kit" })),
    )
    .await;
    let plugin = body_json(response).await;
    let plugin_id = plugin["id"].as_str().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/api/plugins/{plugin_id}/skills"),
        Some(&cookie),
        Some(json!({ "skill_ids": ["no-such-skill"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn browse_filters_by_category() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "prose", json!({ "category": "writing" })).await;
    publish_skill(&app, &cookie, "pipeline", json!({ "category": "devops" })).await;

    let response = send(&app, "GET", "/api/browse", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["skills"].as_array().unwrap().len(), 2);

    let response = send(&app, "GET", "/api/browse?category=writing", None, None).await;
    let body = body_json(response).await;
    let skills = body["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["name"], "prose");
    assert_eq!(skills[0]["author"]["username"], "alice");
}

#[tokio::test]
async fn waitlist_signup_is_idempotent() {
    let (app, _tmp) = test_app();
    for _ in 0..2 {
        let response = send(
            &app,
            "POST",
            "/api/waitlist",
            None,
            Some(json!({ "email": "eve@example.com" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
    }
}

#[tokio::test]
async fn follow_unfollow_and_counts() {
    let (app, _tmp) = test_app();
    let alice = login_as(&app, "alice").await;
    let _bob = login_as(&app, "bob").await;

    let response = send(&app, "POST", "/api/users/bob/follow", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Duplicate follows conflict rather than double count.
    let response = send(&app, "POST", "/api/users/bob/follow", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Following yourself is rejected outright.
    let response = send(&app, "POST", "/api/users/alice/follow", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/dashboard", Some(&alice), None).await;
    let body = body_json(response).await;
    assert_eq!(body["following"], 1);
    assert_eq!(body["followers"], 0);

    let response = send(&app, "DELETE", "/api/users/bob/follow", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/dashboard", Some(&alice), None).await;
    let body = body_json(response).await;
    assert_eq!(body["following"], 0);
}

#[tokio::test]
async fn profile_lists_published_skills() {
    let (app, _tmp) = test_app();
    let cookie = login_as(&app, "alice").await;
    publish_skill(&app, &cookie, "demo", json!({})).await;

    let response = send(&app, "GET", "/api/users/alice", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    let skills = body["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["name"], "demo");
    assert_eq!(skills[0]["version"], "1.0.0");
    assert_eq!(skills[0]["content_hash"], DEMO_HASH);
}

#[tokio::test]
async fn unknown_resources_are_404() {
    let (app, _tmp) = test_app();
    let response = send(&app, "GET", "/api/skills/ghost/demo", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 404);

    let response = send(&app, "GET", "/api/users/ghost", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/api/plugins/ghost/kit", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
