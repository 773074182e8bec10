//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;

use common::*;
use glimpse::server::{self, AppState};

fn activate_request(key: &str, url: &str) -> Request<Body> {
    Request::put(format!("/api/v1/sessions/{key}"))
        .header("Content-Type", "application/json")
        .body(Body::from(format!(r#"{{"url": "{url}"}}"#)))
        .unwrap()
}

fn post_request(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Health Endpoints
// ============================================================================

#[tokio::test]
async fn test_livez() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_readyz() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Sessions API
// ============================================================================

#[tokio::test]
async fn test_activate_creates_session() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["key"], "tab_1");
    assert_eq!(json["current"], true);
    assert_eq!(json["has_page_content"], false);
    assert_eq!(json["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_activate_rejects_empty_url() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .oneshot(activate_request("tab_1", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_session_is_404() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/tab_missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_summarize_then_ask() {
    let llm = ScriptedGenerator::new(vec![
        Ok(STRUCTURED_REPLY.to_string()),
        Ok("Because of X.".to_string()),
    ]);
    let app = test_app(llm, Arc::new(StaticContent));

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_request("/api/v1/sessions/tab_1/summarize", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["has_page_content"], true);
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    assert_eq!(json["messages"][0]["sender"], "assistant");

    let response = app
        .oneshot(post_request(
            "/api/v1/sessions/tab_1/ask",
            r#"{"content": "why?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["sender"], "user");
    assert_eq!(messages[2]["text"], "Because of X.");
}

#[tokio::test]
async fn test_summarize_without_api_key_is_precondition_failed() {
    let h = harness(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));
    h.settings.update(|s| s.api_key.clear()).await;
    let app = server::build_app(
        AppState {
            controller: h.controller.clone(),
        },
        30,
    );

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_request("/api/v1/sessions/tab_1/summarize", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_summarize_extraction_failure_is_bad_gateway() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(FailingContent));

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_request("/api/v1/sessions/tab_1/summarize", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_summarize_while_busy_is_conflict() {
    let (llm, mut entered, gate) = GatedGenerator::new(STRUCTURED_REPLY);
    let app = test_app(llm, Arc::new(StaticContent));

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let pending_app = app.clone();
    let pending = tokio::spawn(async move {
        pending_app
            .oneshot(post_request("/api/v1/sessions/tab_1/summarize", "{}"))
            .await
            .unwrap()
    });
    entered.recv().await.expect("summarize should reach the gateway");

    let response = app
        .oneshot(post_request("/api/v1/sessions/tab_1/summarize", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "busy");

    gate.add_permits(1);
    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ask_without_content_is_a_noop() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_request(
            "/api/v1/sessions/tab_1/ask",
            r#"{"content": "hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_close_session() {
    let app = test_app(ScriptedGenerator::new(vec![]), Arc::new(StaticContent));

    let response = app
        .clone()
        .oneshot(activate_request("tab_1", "https://a.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/v1/sessions/tab_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/tab_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
