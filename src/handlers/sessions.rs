use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::content::PageTarget;
use crate::response;
use crate::server::AppState;
use crate::session::ChatError;

#[derive(Deserialize)]
pub struct ActivateRequest {
    url: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    content: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    key: String,
    current: bool,
    has_page_content: bool,
    messages: Vec<MessageResponse>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    sender: String,
    text: String,
    timestamp: String,
}

async fn session_view(state: &AppState, key: &str) -> SessionResponse {
    let messages = state
        .controller
        .history(key)
        .await
        .into_iter()
        .map(|m| MessageResponse {
            sender: m.sender.to_string(),
            text: m.text,
            timestamp: m.timestamp.to_rfc3339(),
        })
        .collect();

    SessionResponse {
        key: key.to_string(),
        current: state.controller.current_key().await.as_deref() == Some(key),
        has_page_content: state.controller.has_page(key).await,
        messages,
    }
}

fn chat_error_response(error: &ChatError) -> Response {
    match error {
        ChatError::Busy => response::conflict(error.to_string()).into_response(),
        ChatError::Configuration => {
            response::precondition_failed(error.to_string()).into_response()
        }
        ChatError::Extraction(_) | ChatError::Generation(_) => {
            response::bad_gateway(error.to_string()).into_response()
        }
    }
}

/// PUT /api/v1/sessions/{key}
///
/// Activate the session for a tab, creating it lazily. The body names the
/// page the tab is showing.
pub async fn activate_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ActivateRequest>,
) -> Response {
    if req.url.trim().is_empty() {
        return response::bad_request("url must not be empty").into_response();
    }

    let target = PageTarget {
        url: req.url,
        title: req.title,
    };
    state.controller.activate(&key, target).await;

    (StatusCode::OK, Json(session_view(&state, &key).await)).into_response()
}

/// GET /api/v1/sessions/{key}
pub async fn get_session(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if !state.controller.contains(&key).await {
        return response::not_found(format!("Session '{key}' not found")).into_response();
    }

    (StatusCode::OK, Json(session_view(&state, &key).await)).into_response()
}

/// POST /api/v1/sessions/{key}/summarize
pub async fn summarize_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Response {
    if !state.controller.contains(&key).await {
        return response::not_found(format!("Session '{key}' not found")).into_response();
    }

    match state.controller.summarize(&key).await {
        Ok(()) => (StatusCode::OK, Json(session_view(&state, &key).await)).into_response(),
        Err(e) => chat_error_response(&e),
    }
}

/// POST /api/v1/sessions/{key}/ask
pub async fn ask_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<AskRequest>,
) -> Response {
    if !state.controller.contains(&key).await {
        return response::not_found(format!("Session '{key}' not found")).into_response();
    }

    match state.controller.ask(&key, &req.content).await {
        Ok(()) => (StatusCode::OK, Json(session_view(&state, &key).await)).into_response(),
        Err(e) => chat_error_response(&e),
    }
}

/// POST /api/v1/sessions/{key}/cancel
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Response {
    state.controller.cancel(&key).await;
    StatusCode::NO_CONTENT.into_response()
}

/// DELETE /api/v1/sessions/{key}
///
/// Tab-closed notification; the session is evicted.
pub async fn close_session(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    state.controller.close(&key).await;
    StatusCode::NO_CONTENT.into_response()
}
