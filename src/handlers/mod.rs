//! HTTP request handlers.

mod sessions;

pub use sessions::{
    activate_session, ask_session, cancel_session, close_session, get_session, summarize_session,
};

pub async fn livez() -> &'static str {
    "ok"
}

pub async fn readyz() -> &'static str {
    "ok"
}
