//! HTTP-level integration tests for the assistant API.
//!
//! Requests go through the full router, including the session layer, via
//! `tower::ServiceExt::oneshot`. The session cookie from the first response
//! is carried on later requests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use vendai_assistant::dispatcher::{APOLOGY, SQL_RESULT_LABEL};
use vendai_assistant::openai::testing::ScriptedBackend;
use vendai_integration_tests::test_app;

// ── Test client helpers ────────────────────────────────────────

struct TestResponse {
    status: StatusCode,
    cookie: Option<String>,
    body: String,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("JSON body")
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();

    TestResponse {
        status,
        cookie,
        body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
    }
}

/// Open a session and register Ada on it; returns the session cookie.
async fn register_ada(app: &Router) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": "Ada", "email": "ada@vendease.com", "age": 36})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.cookie.expect("session cookie")
}

fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).expect("event JSON"))
        .collect()
}

// ── Health and session ─────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_new_session_starts_on_register_page() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let response = send(&app, Method::GET, "/api/session", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .cookie
            .as_deref()
            .is_some_and(|c| c.starts_with("vendai_session=")),
        "session cookie issued"
    );
    let body = response.json();
    assert_eq!(body["current_page"], "register");
    assert!(body["user_info"].is_null());
    assert_eq!(body["messages"], json!([]));
}

#[tokio::test]
async fn test_chat_page_requires_registration() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let response = send(&app, Method::POST, "/api/page", None, Some(json!({"page": "Chatbot"}))).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["page"], "register");
    assert_eq!(body["warning"], "Please register first!");
}

#[tokio::test]
async fn test_unknown_page_is_bad_request() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let response = send(&app, Method::POST, "/api/page", None, Some(json!({"page": "settings"}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_form() {
    let app = test_app(Arc::new(ScriptedBackend::new()));

    let bad_email = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": "Ada", "email": "not-an-email", "age": 36})),
    )
    .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let bad_age = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": "Ada", "email": "ada@vendease.com", "age": 130})),
    )
    .await;
    assert_eq!(bad_age.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_flash_shows_once() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let cookie = register_ada(&app).await;

    let first = send(&app, Method::GET, "/api/session", Some(&cookie), None).await.json();
    assert_eq!(first["current_page"], "chat");
    assert_eq!(first["greeting"], "Welcome Ada!");
    assert_eq!(first["notice"], "Registration successful!");

    let second = send(&app, Method::GET, "/api/session", Some(&cookie), None).await.json();
    assert!(second["notice"].is_null());
}

// ── Chat ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_before_registration_conflicts() {
    let backend = Arc::new(ScriptedBackend::new());
    let app = test_app(backend.clone());
    let response = send(&app, Method::POST, "/api/chat", None, Some(json!({"message": "hi"}))).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["error"], "Please register first!");
    assert!(backend.requests().is_empty(), "model never called");
}

#[tokio::test]
async fn test_chat_model_outage_is_an_apology_not_an_error() {
    let app = test_app(Arc::new(ScriptedBackend::new().with_failure("down")));
    let cookie = register_ada(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(&cookie),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.json()["reply"], APOLOGY);
}

#[tokio::test]
async fn test_chat_turn_is_recorded_in_session() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_function_call("generate_sql", r#"{"query":"my deliveries"}"#)
            .with_text("SELECT * FROM deliveries;"),
    );
    let app = test_app(backend);
    let cookie = register_ada(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(&cookie),
        Some(json!({"message": "List my deliveries"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let body = response.json();
    assert_eq!(body["tool"], "generate_sql");
    assert_eq!(body["reply"], format!("{SQL_RESULT_LABEL}SELECT * FROM deliveries;"));

    let session = send(&app, Method::GET, "/api/session", Some(&cookie), None).await.json();
    let turns: Vec<(&str, &str)> = session["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .filter_map(|t| Some((t["role"].as_str()?, t["content"].as_str()?)))
        .collect();
    let reply = format!("{SQL_RESULT_LABEL}SELECT * FROM deliveries;");
    assert_eq!(
        turns,
        vec![("user", "List my deliveries"), ("assistant", reply.as_str())]
    );
}

#[tokio::test]
async fn test_sessions_do_not_share_conversations() {
    let backend = Arc::new(
        ScriptedBackend::new().with_function_call("local_discovery", r#"{"query":"apple"}"#),
    );
    let app = test_app(backend);
    let ada = register_ada(&app).await;

    send(&app, Method::POST, "/api/chat", Some(&ada), Some(json!({"message": "apple"}))).await;

    let stranger = send(&app, Method::GET, "/api/session", None, None).await.json();
    assert_eq!(stranger["messages"], json!([]));
    assert!(stranger["user_info"].is_null());
}

#[tokio::test]
async fn test_chat_stream_events() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_text("no tool")
            .with_stream(&["Hello ", "Ada!"]),
    );
    let app = test_app(backend);
    let cookie = register_ada(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/api/chat/stream",
        Some(&cookie),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let events = sse_events(&response.body);
    assert_eq!(
        events,
        vec![
            json!({"type": "tool", "name": null}),
            json!({"type": "delta", "text": "Hello "}),
            json!({"type": "delta", "text": "Ada!"}),
            json!({"type": "done", "reply": "Hello Ada!"}),
        ]
    );

    let session = send(&app, Method::GET, "/api/session", Some(&cookie), None).await.json();
    assert_eq!(session["messages"][1]["content"], "Hello Ada!");
}

#[tokio::test]
async fn test_chat_stream_rejects_blank_message() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let cookie = register_ada(&app).await;
    let response = send(
        &app,
        Method::POST,
        "/api/chat/stream",
        Some(&cookie),
        Some(json!({"message": "   "})),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ── Catalog, tools and orders ──────────────────────────────────

#[tokio::test]
async fn test_tools_lists_builtin_descriptors() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let tools = send(&app, Method::GET, "/api/tools", None, None).await.json();

    let names: Vec<&str> = tools
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["generate_sql", "perform_rag", "local_discovery"]);
}

#[tokio::test]
async fn test_catalog_listing_and_search() {
    let app = test_app(Arc::new(ScriptedBackend::new()));

    let all = send(&app, Method::GET, "/api/catalog", None, None).await.json();
    assert_eq!(all["products"].as_array().map(Vec::len), Some(20));

    let juices = send(&app, Method::GET, "/api/catalog?q=juice", None, None).await.json();
    let products = juices["products"].as_array().expect("products");
    assert!(!products.is_empty());
    assert!(products.iter().all(|p| p["sub_category"] == "Juices"));
}

#[tokio::test]
async fn test_order_requires_registration() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let response = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(json!({"products": ["Apple"]})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_order_is_priced_for_registered_user() {
    let app = test_app(Arc::new(ScriptedBackend::new()));
    let cookie = register_ada(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&cookie),
        Some(json!({"products": ["Apple", "apple", "Unicorn Milk"]})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let order = response.json();
    let lines = order["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l["user_name"] == "Ada" && l["status"] == "pending"));
    assert_eq!(order["total"]["amount"], "1.20");
    assert_eq!(order["unknown"], json!(["Unicorn Milk"]));
}
