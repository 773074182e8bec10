//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, info};

use glimpse::config::{Config, SettingsStore};
use glimpse::content::HttpContentProvider;
use glimpse::llm::GeminiProvider;
use glimpse::server::{self, AppState};
use glimpse::session::{OperationGuard, SessionController, SessionStore, ui_channel};

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path)?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }
    config.chat.apply_env();

    if config.chat.api_key.is_empty() {
        info!(
            "No API key configured. Set chat.api_key in {} or GEMINI_API_KEY; \
             summarize requests will be refused until then.",
            config_path
        );
    }

    // The server has no presentation layer; log the UI signals instead.
    let (events, mut events_rx) = ui_channel();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            debug!(?event, "ui event");
        }
    });

    let client = reqwest::Client::new();
    let controller = SessionController::new(
        SessionStore::new(),
        OperationGuard::new(),
        Arc::new(GeminiProvider::new(client.clone())),
        Arc::new(HttpContentProvider::new(client)),
        SettingsStore::new(config.chat.clone()),
        events,
    );

    let app = server::build_app(
        AppState { controller },
        config.server.request_timeout_seconds,
    );

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid host '{}'", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
