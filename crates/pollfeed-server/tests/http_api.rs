use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pollfeed_server::api::server::router;
use pollfeed_server::api::QueryService;
use pollfeed_server::db::MessageLog;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::Router {
    let log = MessageLog::open_in_memory().expect("in-memory log");
    router(QueryService::new(Arc::new(log)))
}

async fn call(app: &axum::Router, request: Request<Body>) -> Value {
    let response = app.clone().oneshot(request).await.expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn send_then_fetch_over_http() {
    let app = app();

    let sent = call(&app, post("/?action=send", json!({"author": "Alice", "body": "hello"}))).await;
    assert_eq!(sent, json!({"ok": true, "id": 1}));
    let sent = call(&app, post("/api?action=send", json!({"author": "Bob", "body": "world"}))).await;
    assert_eq!(sent, json!({"ok": true, "id": 2}));

    let stats = call(&app, get("/?action=stats")).await;
    assert_eq!(stats, json!({"ok": true, "total": 2, "maxId": 2}));

    let since = call(&app, get("/?action=fetchSince&cursor=1&limit=10")).await;
    let messages = since["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], 2);
    assert_eq!(messages[0]["author"], "Bob");

    let recent = call(&app, get("/?action=fetchRecent&count=1")).await;
    assert_eq!(recent["messages"][0]["id"], 2);
}

#[tokio::test]
async fn empty_body_is_rejected_without_append() {
    let app = app();

    let reply = call(&app, post("/?action=send", json!({"author": "Alice", "body": ""}))).await;
    assert_eq!(reply["ok"], false);
    assert!(reply["error"].is_string());

    let stats = call(&app, get("/?action=stats")).await;
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["maxId"], 0);
}

#[tokio::test]
async fn wrong_method_and_unknown_action() {
    let app = app();
    let invalid = json!({"ok": false, "error": "Invalid action or method."});

    assert_eq!(call(&app, get("/?action=send")).await, invalid);
    assert_eq!(call(&app, post("/?action=stats", json!({}))).await, invalid);
    assert_eq!(call(&app, get("/?action=purge")).await, invalid);
    assert_eq!(call(&app, get("/")).await, invalid);
}

#[tokio::test]
async fn health_reports_store() {
    let app = app();
    assert_eq!(call(&app, get("/health")).await, json!({"ok": true}));
}
