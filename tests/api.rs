//! End-to-end tests driving the router in process

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use eco_grid::{
    api::create_router,
    core::{factory, Config},
    security::TokenSigner,
    services::CompletionClient,
    types::{Role, User},
};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@eco-grid.io";
const ADMIN_PASSWORD: &str = "admin-password-123";

struct CannedClient;

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> eco_grid::Result<String> {
        Ok(r#"{"title": "Storage on the Grid", "excerpt": "Short", "content": "Body text", "tags": ["storage"]}"#.into())
    }
}

fn app(seed: bool) -> Router {
    let mut config = Config::default();
    config.auth.token_secret = Some("integration-test-secret".into());
    app_with(config, seed)
}

fn app_with(mut config: Config, seed: bool) -> Router {
    config.auth.admin_email = Some(ADMIN_EMAIL.into());
    config.auth.admin_password = Some(ADMIN_PASSWORD.into());
    config.server.seed_demo_content = seed;
    config.telemetry.enabled = false;

    let state = factory::create_app_state_with_client(config, Arc::new(CannedClient)).unwrap();
    create_router(state)
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "name": "Grace", "password": "solar-panels-42" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_and_info_are_public() {
    let app = app(false);

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");

    let (status, body) = call(&app, Method::GET, "/info", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "eco-grid");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app(false);
    let (token, _) = register(&app, "grace@example.com").await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "grace@example.com");
    assert_eq!(body["data"]["role"], "user");

    let again = login(&app, "Grace@Example.com", "solar-panels-42").await;
    assert!(!again.is_empty());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "grace@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some("garbage.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seeded_public_lists_are_paginated() {
    let app = app(true);

    let (status, body) = call(&app, Method::GET, "/api/articles?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["total_pages"], 2);

    let (status, body) = call(&app, Method::GET, "/api/articles?limit=500", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, body) = call(&app, Method::GET, "/api/roadmap", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["quarter"], "Q1 2025");

    let (status, body) = call(&app, Method::GET, "/api/pilots/summary", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pilots"], 3);

    let (status, body) = call(&app, Method::GET, "/api/plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn roles_and_feature_gates() {
    let app = app(false);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (token, user_id) = register(&app, "writer@example.com").await;

    let article = json!({
        "title": "Grid Flexibility 101",
        "excerpt": "Basics",
        "content": "Body",
        "category": "technology",
    });

    // Plain users cannot write content
    let (status, body) = call(&app, Method::POST, "/api/articles", Some(&token), Some(article.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/users/{}/role", user_id),
        Some(&admin),
        Some(json!({ "role": "editor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/articles", Some(&token), Some(article)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["slug"], "grid-flexibility-101");
    assert_eq!(body["data"]["status"], "draft");

    // Free tier has no AI generations
    let generate = json!({ "topic": "home storage", "save_as_draft": true });
    let (status, body) = call(&app, Method::POST, "/api/ai/generate", Some(&token), Some(generate.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "feature_limit_reached");
    assert_eq!(body["details"]["feature"], "ai_generations");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/subscriptions/me",
        Some(&token),
        Some(json!({ "tier": "starter" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"]["tier"], "starter");

    let (status, body) = call(&app, Method::POST, "/api/ai/generate", Some(&token), Some(generate)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["generated"]["title"], "Storage on the Grid");
    assert_eq!(body["data"]["draft"]["slug"], "storage-on-the-grid");

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/subscriptions/me/features/ai_generations",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["usage"], 1);
    assert_eq!(body["data"]["allowed"], true);

    // Admin-only endpoints stay closed to editors
    let (status, _) = call(&app, Method::GET, "/api/audit", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, Method::GET, "/api/audit?resource=articles", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["meta"]["total"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn calculator_and_chat() {
    let app = app(false);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/calculator/savings",
        None,
        Some(json!({ "monthly_bill": 200.0, "devices": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["monthly_savings"], 50.0);
    assert_eq!(body["data"]["annual_savings"], 600.0);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/calculator/savings",
        None,
        Some(json!({ "monthly_bill": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["details"][0]["field"], "monthly_bill");

    let (status, body) = call(&app, Method::POST, "/api/chat/sessions", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let session = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/chat/sessions/{}/messages", session),
        None,
        Some(json!({ "message": "How much does the Starter plan cost?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["intent"], "pricing");

    let (status, body) = call(&app, Method::GET, &format!("/api/chat/sessions/{}", session), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = app(false);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/calculator/savings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "invalid_input");

    let (status, body) = call(&app, Method::GET, "/api/pilots/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/articles/no-such-article", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn default_config_rejects_forged_admin_tokens() {
    let app = app_with(Config::default(), true);

    // Public article JSON carries the author's name but not the account id
    let (status, body) = call(&app, Method::GET, "/api/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let first = &body["data"][0];
    assert!(first.get("author_id").is_none(), "{first}");
    assert!(first["author_name"].is_string());

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, me) = call(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;

    let mut impostor = User::new(ADMIN_EMAIL, "Administrator", Role::Admin, String::new(), String::new());
    impostor.id = me["data"]["id"].as_str().unwrap().parse().unwrap();
    let forged = TokenSigner::new("eco-grid-development-secret", std::time::Duration::from_secs(3600))
        .issue(&impostor)
        .unwrap();

    let (status, body) = call(&app, Method::GET, "/api/users", Some(&forged.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = call(&app, Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn signed_in_calls_count_against_the_api_quota() {
    let app = app(true);
    let (token, _) = register(&app, "metered@example.com").await;

    for _ in 0..2 {
        let (status, _) = call(&app, Method::GET, "/api/articles", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(&app, Method::GET, "/api/subscriptions/me/features/api_calls", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["usage"], 2);
    assert_eq!(body["data"]["limit"], 1_000);

    // A cancelled subscription shuts metered routes but not the account ones
    let (status, _) = call(&app, Method::DELETE, "/api/subscriptions/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, "/api/articles", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "feature_limit_reached");
    assert_eq!(body["details"]["feature"], "api_calls");

    let (status, _) = call(&app, Method::GET, "/api/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/subscriptions/me",
        Some(&token),
        Some(json!({ "tier": "starter" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/api/articles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
