//! Router tests against the in-memory store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use segmentctl_server::{build_router, AppState, MemoryStore, ServerConfig};

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()));
    build_router(state, &ServerConfig::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, username: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/users",
        Some(json!({"firstname": "Test", "lastname": "User", "username": username})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_segments(app: &Router, names: &[&str]) {
    for name in names {
        let (status, _) = send(app, "POST", "/api/v1/segments", Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

async fn segments_of(app: &Router, id: i64) -> Value {
    let (status, body) = send(app, "GET", &format!("/api/v1/users/{id}/segments"), None).await;
    assert_eq!(status, StatusCode::OK);
    body["segments"].clone()
}

#[tokio::test]
async fn health_endpoint() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn reconcile_overlapping_request() {
    let app = app();
    let id = create_user(&app, "alice").await;
    create_segments(&app, &["red", "blue", "green"]).await;

    let uri = format!("/api/v1/users/{id}/segments");
    let (status, _) = send(&app, "PUT", &uri, Some(json!({"segments_to_add": ["red", "blue"]}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({
            "segments_to_add": ["blue", "green"],
            "segments_to_remove": ["red", "green"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    assert_eq!(segments_of(&app, id).await, json!(["blue"]));
}

#[tokio::test]
async fn duplicate_adds_collapse() {
    let app = app();
    let id = create_user(&app, "bob").await;
    create_segments(&app, &["x"]).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{id}/segments"),
        Some(json!({"segments_to_add": ["x", "x"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, segment) = send(&app, "GET", "/api/v1/segments/x", None).await;
    assert_eq!(segment["member_count"], 1);
}

#[tokio::test]
async fn unknown_segment_is_404_and_changes_nothing() {
    let app = app();
    let id = create_user(&app, "carol").await;
    create_segments(&app, &["a"]).await;

    let uri = format!("/api/v1/users/{id}/segments");
    send(&app, "PUT", &uri, Some(json!({"segments_to_add": ["a"]}))).await;

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"segments_to_add": ["missing"], "segments_to_remove": ["a"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    assert_eq!(segments_of(&app, id).await, json!(["a"]));
}

#[tokio::test]
async fn unknown_user_is_404() {
    let app = app();
    create_segments(&app, &["a"]).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/users/999/segments",
        Some(json!({"segments_to_add": ["a"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "user '999' not found");
}

#[tokio::test]
async fn blank_segment_name_is_400() {
    let app = app();
    let id = create_user(&app, "dave").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{id}/segments"),
        Some(json!({"segments_to_remove": ["  "]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let app = app();
    let id = create_user(&app, "erin").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{id}/segments"),
        Some(json!({"segments_to_add": "not-a-list"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn non_numeric_user_id_is_400() {
    let (status, _) = send(&app(), "GET", "/api/v1/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn single_membership_endpoints_are_idempotent() {
    let app = app();
    let id = create_user(&app, "frank").await;
    create_segments(&app, &["promo"]).await;

    let uri = format!("/api/v1/segments/promo/users/{id}");
    for _ in 0..2 {
        let (status, _) = send(&app, "PUT", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, members) = send(&app, "GET", "/api/v1/segments/promo/users", None).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["username"], "frank");

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    assert_eq!(segments_of(&app, id).await, json!([]));
}

#[tokio::test]
async fn user_crud() {
    let app = app();
    let id = create_user(&app, "grace").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({"firstname": "G", "lastname": "H", "username": "grace"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/v1/users/{id}");
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"firstname": "Grace", "lastname": "Hopper", "username": "ghopper"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ghopper");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"id": id + 1, "firstname": "G", "lastname": "H", "username": "g"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastname"], "Hopper");
    assert_eq!(body["segments"], json!([]));

    let (status, users) = send(&app, "GET", "/api/v1/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn segment_crud_and_cascade() {
    let app = app();
    let id = create_user(&app, "heidi").await;
    create_segments(&app, &["a", "b"]).await;

    let (status, _) = send(&app, "POST", "/api/v1/segments", Some(json!({"name": "a"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "PUT",
        &format!("/api/v1/users/{id}/segments"),
        Some(json!({"segments_to_add": ["a", "b"]})),
    )
    .await;

    let (status, list) = send(&app, "GET", "/api/v1/segments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["name"], "a");
    assert_eq!(list[0]["member_count"], 1);

    let (status, _) = send(&app, "DELETE", "/api/v1/segments/a", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/api/v1/segments/a", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(segments_of(&app, id).await, json!(["b"]));
}

#[tokio::test]
async fn single_membership_on_missing_segment_is_404() {
    let app = app();
    let id = create_user(&app, "ivan").await;
    create_segments(&app, &["a"]).await;
    send(&app, "PUT", &format!("/api/v1/segments/a/users/{id}"), None).await;

    for method in ["PUT", "DELETE"] {
        let (status, body) = send(&app, method, &format!("/api/v1/segments/missing/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "segment 'missing' not found");
    }

    assert_eq!(segments_of(&app, id).await, json!(["a"]));
}
