use std::time::Duration;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::session::SessionController;

#[derive(Clone)]
pub struct AppState {
    pub controller: SessionController,
}

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    let api_v1 = Router::new()
        .route(
            "/sessions/{key}",
            put(handlers::activate_session)
                .get(handlers::get_session)
                .delete(handlers::close_session),
        )
        .route("/sessions/{key}/summarize", post(handlers::summarize_session))
        .route("/sessions/{key}/ask", post(handlers::ask_session))
        .route("/sessions/{key}/cancel", post(handlers::cancel_session))
        .with_state(state);

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .nest("/api/v1", api_v1)
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
}
